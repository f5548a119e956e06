use crate::server::blog::{PostPath, TaggedPath};
use axum_extra::routing::TypedPath;
use quill_common::database::Tag;
use quill_common::page::{PostDetail, PostSummary, TagSummary};

pub trait ServerPathExt {
    type Path: TypedPath;

    fn full_path(&self) -> Self::Path;
}

impl ServerPathExt for PostSummary {
    type Path = PostPath;

    fn full_path(&self) -> Self::Path {
        PostPath {
            slug: self.slug.clone(),
        }
    }
}

impl ServerPathExt for PostDetail {
    type Path = PostPath;

    fn full_path(&self) -> Self::Path {
        PostPath {
            slug: self.slug.clone(),
        }
    }
}

impl ServerPathExt for Tag {
    type Path = TaggedPath;

    fn full_path(&self) -> Self::Path {
        TaggedPath {
            tag_title: self.0.clone(),
        }
    }
}

impl ServerPathExt for TagSummary {
    type Path = TaggedPath;

    fn full_path(&self) -> Self::Path {
        TaggedPath {
            tag_title: self.title.clone(),
        }
    }
}

pub trait FirstTagExt {
    fn first_tag_path(&self) -> Option<TaggedPath>;
}

impl FirstTagExt for PostSummary {
    fn first_tag_path(&self) -> Option<TaggedPath> {
        self.first_tag_title.as_ref().map(|title| TaggedPath {
            tag_title: title.clone(),
        })
    }
}
