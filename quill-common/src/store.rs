use crate::blog::{AnnotatedPost, Comment, Post, PostRanking, TagStats};
use crate::database::{self, Result, Tag};
use async_trait::async_trait;
use sqlx::PgPool;

/// Read-only queries the page assembler needs.
///
/// Every method maps to a bounded number of round trips, independent of how
/// many records it returns.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// At most `limit` posts in `ranking` order, restricted to posts carrying
    /// `tag` if one is given.
    async fn ranked_posts(
        &self,
        ranking: PostRanking,
        tag: Option<&Tag>,
        limit: usize,
    ) -> Result<Vec<AnnotatedPost>>;

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Comments with their authors already resolved, oldest first.
    async fn comments_for_post(&self, post: &Post) -> Result<Vec<Comment>>;

    async fn like_count(&self, post: &Post) -> Result<i64>;

    /// Tags ordered by how many posts carry them.
    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagStats>>;

    async fn tag_by_title(&self, title: &str) -> Result<Option<Tag>>;
}

#[async_trait]
impl BlogStore for PgPool {
    async fn ranked_posts(
        &self,
        ranking: PostRanking,
        tag: Option<&Tag>,
        limit: usize,
    ) -> Result<Vec<AnnotatedPost>> {
        database::get_ranked_posts(ranking, tag, limit, self).await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        database::get_post_by_slug(slug, self).await
    }

    async fn comments_for_post(&self, post: &Post) -> Result<Vec<Comment>> {
        database::get_comments_for_post(post.id, self).await
    }

    async fn like_count(&self, post: &Post) -> Result<i64> {
        database::get_like_count(post.id, self).await
    }

    async fn popular_tags(&self, limit: usize) -> Result<Vec<TagStats>> {
        database::get_popular_tags(limit, self).await
    }

    async fn tag_by_title(&self, title: &str) -> Result<Option<Tag>> {
        database::get_tag_by_title(title, self).await
    }
}
