use crate::database::{Author, Tag};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// URL prefix under which stored images are served.
pub const MEDIA_URL: &str = "/media/";

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub text: String,
    pub author: Author,
    /// Storage path of the cover image, relative to the media root.
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Ordered by tag creation.
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn first_tag(&self) -> Option<&Tag> {
        self.tags.first()
    }

    pub fn image_url(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(|path| format!("{MEDIA_URL}{}", path.trim_start_matches('/')))
    }
}

/// A post together with the number of comments it had when it was fetched.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AnnotatedPost {
    pub post: Post,
    pub comments_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TagStats {
    pub tag: Tag,
    pub posts_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, sqlx::FromRow)]
pub struct Comment {
    pub text: String,
    pub author: Author,
    pub published_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostRanking {
    /// Most liked first.
    Popular,
    /// Most recently published first.
    Fresh,
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
