pub mod templates;

use crate::server::{Error, Result};
use crate::AppState;
use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum::Router;
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::page;
use quill_common::store::BlogStore;
use serde::Deserialize;
use std::sync::Arc;
use templates::{PostDetailTemplate, TaggedTemplate};

pub fn router() -> Router<AppState> {
    Router::new().typed_get(post).typed_get(tagged)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/post/:slug", rejection(Error))]
pub struct PostPath {
    pub slug: String,
}

pub async fn post(
    PostPath { slug }: PostPath,
    State(store): State<Arc<dyn BlogStore>>,
) -> Result<Html<String>> {
    let context = page::build_post_detail_context(&*store, &slug).await?;

    let html = PostDetailTemplate { context }.render()?;
    Ok(Html(html))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tag/:tag_title", rejection(Error))]
pub struct TaggedPath {
    pub tag_title: String,
}

pub async fn tagged(
    TaggedPath { tag_title }: TaggedPath,
    State(store): State<Arc<dyn BlogStore>>,
) -> Result<Html<String>> {
    let context = page::build_tag_filter_context(&*store, &tag_title).await?;

    let html = TaggedTemplate { context }.render()?;
    Ok(Html(html))
}
