use crate::model::{FirstTagExt, ServerPathExt};
use askama::Template;
use quill_common::markdown_render::render_md_to_html;
use quill_common::page::{PostDetailContext, TagFilterContext};

#[derive(Template)]
#[template(path = "post-details.html")]
pub struct PostDetailTemplate {
    pub context: PostDetailContext,
}

impl PostDetailTemplate {
    pub fn text_html(&self) -> String {
        render_md_to_html(&self.context.post.text)
    }
}

#[derive(Template)]
#[template(path = "posts-list.html")]
pub struct TaggedTemplate {
    pub context: TagFilterContext,
}
