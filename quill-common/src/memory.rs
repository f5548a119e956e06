//! A [`BlogStore`] backed by plain vectors, loaded from a [`Dataset`].
//!
//! Orders results exactly like the PostgreSQL queries and counts every query
//! it answers, which makes it suitable both for offline previews and for
//! checking how many round trips a page needs.

use crate::blog::{AnnotatedPost, Comment, Post, PostRanking, TagStats};
use crate::database::{Author, Result, Tag};
use crate::store::BlogStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Slug '{0}' is used by more than one post")]
    DuplicateSlug(String),
    #[error("Comment refers to unknown post '{0}'")]
    UnknownPost(String),
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
pub struct Dataset {
    /// Tags in creation order. Tags only mentioned by posts are appended.
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub posts: Vec<DatasetPost>,
    #[serde(default)]
    pub comments: Vec<DatasetComment>,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct DatasetPost {
    pub slug: String,
    pub title: String,
    pub text: String,
    pub author: Author,
    #[serde(default)]
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub likes: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct DatasetComment {
    /// Slug of the commented post.
    pub post: String,
    pub author: Author,
    pub text: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StoredPost {
    post: Post,
    likes: i64,
}

#[derive(Debug)]
pub struct MemoryStore {
    tags: Vec<Tag>,
    posts: Vec<StoredPost>,
    /// Sorted by publication, ties kept in insertion order.
    comments: Vec<(i64, Comment)>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new(dataset: Dataset) -> Result<Self, DatasetError> {
        let Dataset {
            tags,
            posts,
            comments,
        } = dataset;

        let tags: Vec<Tag> = tags
            .into_iter()
            .chain(posts.iter().flat_map(|post| post.tags.iter().cloned()))
            .unique()
            .collect();

        let tag_position = |tag: &Tag| tags.iter().position(|known| known == tag);

        let mut slugs = HashSet::new();
        let mut stored_posts = Vec::with_capacity(posts.len());

        for (idx, post) in posts.into_iter().enumerate() {
            if !slugs.insert(post.slug.clone()) {
                return Err(DatasetError::DuplicateSlug(post.slug));
            }

            let post_tags = post
                .tags
                .into_iter()
                .unique()
                .sorted_by_key(|tag| tag_position(tag))
                .collect();

            stored_posts.push(StoredPost {
                post: Post {
                    id: idx as i64 + 1,
                    slug: post.slug,
                    title: post.title,
                    text: post.text,
                    author: post.author,
                    image: post.image,
                    published_at: post.published_at,
                    tags: post_tags,
                },
                likes: post.likes,
            });
        }

        let mut stored_comments = comments
            .into_iter()
            .map(|comment| -> Result<_, DatasetError> {
                let post_id = stored_posts
                    .iter()
                    .find(|stored| stored.post.slug == comment.post)
                    .map(|stored| stored.post.id)
                    .ok_or_else(|| DatasetError::UnknownPost(comment.post.clone()))?;

                Ok((
                    post_id,
                    Comment {
                        text: comment.text,
                        author: comment.author,
                        published_at: comment.published_at,
                    },
                ))
            })
            .collect::<Result<Vec<_>, DatasetError>>()?;

        stored_comments.sort_by_key(|(_, comment)| comment.published_at);

        Ok(MemoryStore {
            tags,
            posts: stored_posts,
            comments: stored_comments,
            queries: AtomicUsize::new(0),
        })
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    fn comments_count(&self, post_id: i64) -> i64 {
        self.comments
            .iter()
            .filter(|(id, _)| *id == post_id)
            .count() as i64
    }

    fn posts_count(&self, tag: &Tag) -> i64 {
        self.posts
            .iter()
            .filter(|stored| stored.post.tags.contains(tag))
            .count() as i64
    }
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn ranked_posts(
        &self,
        ranking: PostRanking,
        tag: Option<&Tag>,
        limit: usize,
    ) -> Result<Vec<AnnotatedPost>> {
        self.record_query();

        let ranked = self
            .posts
            .iter()
            .filter(|stored| tag.map_or(true, |tag| stored.post.tags.contains(tag)))
            .sorted_by(|a, b| {
                let by_rank = match ranking {
                    PostRanking::Popular => b.likes.cmp(&a.likes),
                    PostRanking::Fresh => std::cmp::Ordering::Equal,
                };

                by_rank
                    .then_with(|| b.post.published_at.cmp(&a.post.published_at))
                    .then_with(|| a.post.slug.cmp(&b.post.slug))
            })
            .take(limit)
            .map(|stored| AnnotatedPost {
                post: stored.post.clone(),
                comments_count: self.comments_count(stored.post.id),
            })
            .collect();

        Ok(ranked)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.record_query();

        Ok(self
            .posts
            .iter()
            .find(|stored| stored.post.slug == slug)
            .map(|stored| stored.post.clone()))
    }

    async fn comments_for_post(&self, post: &Post) -> Result<Vec<Comment>> {
        self.record_query();

        Ok(self
            .comments
            .iter()
            .filter(|(post_id, _)| *post_id == post.id)
            .map(|(_, comment)| comment.clone())
            .collect())
    }

    async fn like_count(&self, post: &Post) -> Result<i64> {
        self.record_query();

        Ok(self
            .posts
            .iter()
            .find(|stored| stored.post.id == post.id)
            .map_or(0, |stored| stored.likes))
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagStats>> {
        self.record_query();

        Ok(self
            .tags
            .iter()
            .map(|tag| TagStats {
                tag: tag.clone(),
                posts_count: self.posts_count(tag),
            })
            .sorted_by(|a, b| {
                b.posts_count
                    .cmp(&a.posts_count)
                    .then_with(|| a.tag.cmp(&b.tag))
            })
            .take(limit)
            .collect())
    }

    async fn tag_by_title(&self, title: &str) -> Result<Option<Tag>> {
        self.record_query();

        Ok(self.tags.iter().find(|tag| tag.0 == title).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{Dataset, DatasetComment, DatasetError, DatasetPost, MemoryStore};
    use crate::blog::PostRanking;
    use crate::database::{Author, Tag};
    use crate::store::BlogStore;
    use chrono::DateTime;

    fn post(slug: &str, tags: &[&str]) -> DatasetPost {
        DatasetPost {
            slug: slug.to_string(),
            title: slug.to_string(),
            text: String::new(),
            author: Author("alice".to_string()),
            image: None,
            published_at: DateTime::UNIX_EPOCH,
            tags: tags.iter().map(|tag| Tag(tag.to_string())).collect(),
            likes: 0,
        }
    }

    #[tokio::test]
    async fn post_tags_follow_tag_creation_order() {
        let store = MemoryStore::new(Dataset {
            tags: vec![Tag("News".to_string()), Tag("Life".to_string())],
            posts: vec![post("a", &["Life", "Rust", "News", "Life"])],
            comments: Vec::new(),
        })
        .unwrap();

        let post = store.post_by_slug("a").await.unwrap().unwrap();
        assert_eq!(
            post.tags,
            [
                Tag("News".to_string()),
                Tag("Life".to_string()),
                Tag("Rust".to_string()),
            ]
        );
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn rejects_duplicate_slugs() {
        let result = MemoryStore::new(Dataset {
            tags: Vec::new(),
            posts: vec![post("a", &[]), post("a", &[])],
            comments: Vec::new(),
        });

        assert!(matches!(result, Err(DatasetError::DuplicateSlug(slug)) if slug == "a"));
    }

    #[test]
    fn rejects_comments_on_unknown_posts() {
        let result = MemoryStore::new(Dataset {
            tags: Vec::new(),
            posts: vec![post("a", &[])],
            comments: vec![DatasetComment {
                post: "b".to_string(),
                author: Author("bob".to_string()),
                text: "Hi".to_string(),
                published_at: DateTime::UNIX_EPOCH,
            }],
        });

        assert!(matches!(result, Err(DatasetError::UnknownPost(slug)) if slug == "b"));
    }

    #[tokio::test]
    async fn popular_ranking_uses_likes_then_recency() {
        let mut liked = post("liked", &[]);
        liked.likes = 3;
        let mut recent = post("recent", &[]);
        recent.published_at = DateTime::from_timestamp(100, 0).unwrap();

        let store = MemoryStore::new(Dataset {
            tags: Vec::new(),
            posts: vec![post("old", &[]), recent, liked],
            comments: Vec::new(),
        })
        .unwrap();

        let slugs = |posts: Vec<crate::blog::AnnotatedPost>| {
            posts
                .into_iter()
                .map(|annotated| annotated.post.slug)
                .collect::<Vec<_>>()
        };

        let popular = store
            .ranked_posts(PostRanking::Popular, None, 5)
            .await
            .unwrap();
        assert_eq!(slugs(popular), ["liked", "recent", "old"]);

        let fresh = store
            .ranked_posts(PostRanking::Fresh, None, 2)
            .await
            .unwrap();
        assert_eq!(slugs(fresh), ["recent", "liked"]);
    }

    #[test]
    fn dataset_deserializes_from_json() {
        let dataset: Dataset = serde_json::from_str(
            r#"{
                "posts": [{
                    "slug": "hello",
                    "title": "Hello",
                    "text": "Hi there",
                    "author": "alice",
                    "published_at": "2024-01-01T00:00:00Z",
                    "tags": ["News"]
                }],
                "comments": [{
                    "post": "hello",
                    "author": "bob",
                    "text": "Welcome",
                    "published_at": "2024-01-02T00:00:00Z"
                }]
            }"#,
        )
        .unwrap();

        assert!(dataset.tags.is_empty());
        assert_eq!(dataset.posts[0].author, Author("alice".to_string()));
        assert_eq!(dataset.posts[0].likes, 0);
        assert_eq!(dataset.comments[0].post, "hello");
    }
}
