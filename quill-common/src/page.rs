//! View contexts for each page, assembled from a [`BlogStore`].

use crate::blog::{AnnotatedPost, Comment, PostRanking, TagStats};
use crate::database::{self, Author, Tag};
use crate::store::BlogStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Length of the popular/fresh lists on the home page and in the sidebar.
pub const SIDEBAR_LIMIT: usize = 5;
/// Most posts listed on a tag page.
pub const TAG_FILTER_LIMIT: usize = 20;
/// In characters, not bytes.
pub const TEASER_LENGTH: usize = 200;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No post with slug '{0}'")]
    PostNotFound(String),
    #[error("No tag titled '{0}'")]
    TagNotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] database::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::PostNotFound(_) | Error::TagNotFound(_))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub teaser_text: String,
    /// Whether `teaser_text` is shorter than the post body.
    pub teaser_truncated: bool,
    pub author: Author,
    pub comments_amount: i64,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub slug: String,
    pub tags: Vec<Tag>,
    pub first_tag_title: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct TagSummary {
    pub title: String,
    pub posts_with_tag: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct CommentView {
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub author: Author,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct PostDetail {
    pub title: String,
    pub text: String,
    pub author: Author,
    pub comments: Vec<CommentView>,
    pub likes_amount: i64,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub slug: String,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct HomeContext {
    pub most_popular_posts: Vec<PostSummary>,
    pub page_posts: Vec<PostSummary>,
    pub popular_tags: Vec<TagSummary>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct PostDetailContext {
    pub post: PostDetail,
    pub popular_tags: Vec<TagSummary>,
    pub most_popular_posts: Vec<PostSummary>,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct TagFilterContext {
    pub tag: String,
    pub popular_tags: Vec<TagSummary>,
    pub posts: Vec<PostSummary>,
    pub most_popular_posts: Vec<PostSummary>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize)]
pub struct ContactsContext {}

/// The first [`TEASER_LENGTH`] characters of `text`.
pub fn teaser(text: &str) -> &str {
    match text.char_indices().nth(TEASER_LENGTH) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn summarize(
    AnnotatedPost {
        post,
        comments_count,
    }: &AnnotatedPost,
) -> PostSummary {
    let teaser_text = teaser(&post.text);

    PostSummary {
        title: post.title.clone(),
        teaser_text: teaser_text.to_string(),
        teaser_truncated: teaser_text.len() < post.text.len(),
        author: post.author.clone(),
        comments_amount: *comments_count,
        image_url: post.image_url(),
        published_at: post.published_at,
        slug: post.slug.clone(),
        tags: post.tags.clone(),
        first_tag_title: post.first_tag().map(|Tag(title)| title.clone()),
    }
}

pub fn summarize_tag(TagStats { tag, posts_count }: &TagStats) -> TagSummary {
    TagSummary {
        title: tag.0.clone(),
        posts_with_tag: *posts_count,
    }
}

fn view_comment(
    Comment {
        text,
        author,
        published_at,
    }: Comment,
) -> CommentView {
    CommentView {
        text,
        published_at,
        author,
    }
}

async fn summarized_posts<S: BlogStore + ?Sized>(
    store: &S,
    ranking: PostRanking,
    tag: Option<&Tag>,
    limit: usize,
) -> Result<Vec<PostSummary>> {
    let posts = store.ranked_posts(ranking, tag, limit).await?;
    Ok(posts.iter().map(summarize).collect())
}

async fn summarized_popular_tags<S: BlogStore + ?Sized>(store: &S) -> Result<Vec<TagSummary>> {
    let tags = store.popular_tags(SIDEBAR_LIMIT).await?;
    Ok(tags.iter().map(summarize_tag).collect())
}

pub async fn build_home_context<S: BlogStore + ?Sized>(store: &S) -> Result<HomeContext> {
    let most_popular_posts =
        summarized_posts(store, PostRanking::Popular, None, SIDEBAR_LIMIT).await?;
    let page_posts = summarized_posts(store, PostRanking::Fresh, None, SIDEBAR_LIMIT).await?;
    let popular_tags = summarized_popular_tags(store).await?;

    Ok(HomeContext {
        most_popular_posts,
        page_posts,
        popular_tags,
    })
}

pub async fn build_post_detail_context<S: BlogStore + ?Sized>(
    store: &S,
    slug: &str,
) -> Result<PostDetailContext> {
    let post = store
        .post_by_slug(slug)
        .await?
        .ok_or_else(|| Error::PostNotFound(slug.to_string()))?;

    let comments: Vec<_> = store
        .comments_for_post(&post)
        .await?
        .into_iter()
        .map(view_comment)
        .collect();
    let likes_amount = store.like_count(&post).await?;

    debug!(slug, comments = comments.len(), likes_amount, "Loaded post");

    let most_popular_posts =
        summarized_posts(store, PostRanking::Popular, None, SIDEBAR_LIMIT).await?;
    let popular_tags = summarized_popular_tags(store).await?;

    let image_url = post.image_url();
    let post = PostDetail {
        title: post.title,
        text: post.text,
        author: post.author,
        comments,
        likes_amount,
        image_url,
        published_at: post.published_at,
        slug: post.slug,
        tags: post.tags,
    };

    Ok(PostDetailContext {
        post,
        popular_tags,
        most_popular_posts,
    })
}

pub async fn build_tag_filter_context<S: BlogStore + ?Sized>(
    store: &S,
    tag_title: &str,
) -> Result<TagFilterContext> {
    let tag = store
        .tag_by_title(tag_title)
        .await?
        .ok_or_else(|| Error::TagNotFound(tag_title.to_string()))?;

    let posts = summarized_posts(store, PostRanking::Popular, Some(&tag), TAG_FILTER_LIMIT).await?;

    debug!(%tag, posts = posts.len(), "Loaded tagged posts");

    let most_popular_posts =
        summarized_posts(store, PostRanking::Popular, None, SIDEBAR_LIMIT).await?;
    let popular_tags = summarized_popular_tags(store).await?;

    Ok(TagFilterContext {
        tag: tag.0,
        popular_tags,
        posts,
        most_popular_posts,
    })
}

pub fn build_contacts_context() -> ContactsContext {
    ContactsContext {}
}
