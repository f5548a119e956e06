use crate::blog::{AnnotatedPost, Comment, Post, PostRanking, TagStats};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use sqlx::migrate::Migrate;
use sqlx::{migrate, query_as, query_scalar, Acquire, PgExecutor};
use std::ops::Deref;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Input was invalid")]
    InvalidInput,
}

#[derive(
    Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash, sqlx::Type, Serialize, Deserialize,
)]
#[sqlx(transparent, type_name = "text")]
pub struct Author(pub String);

impl From<String> for Author {
    fn from(author: String) -> Self {
        Author(author)
    }
}

#[derive(
    Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash, sqlx::Type, Serialize, Deserialize,
)]
#[sqlx(transparent, type_name = "text")]
pub struct Tag(pub String);

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Tag(tag)
    }
}

/// Selects every column of [`PostRecord`], followed by the given clauses.
///
/// Tags and comment counts come from correlated subqueries so that a listing
/// is always a single statement, no matter how many posts it returns.
macro_rules! select_posts {
    ($($clause:literal),* $(,)?) => {
        concat!(
            "SELECT p.post_id, p.slug, p.title, p.text, a.username AS author, p.image, \
                p.published_at, \
                ARRAY(SELECT t.title FROM post_tag pt JOIN tag t ON t.tag_id = pt.tag_id \
                    WHERE pt.post_id = p.post_id ORDER BY t.tag_id ASC) AS tags, \
                (SELECT count(*) FROM comment c WHERE c.post_id = p.post_id) AS comments_count \
            FROM post p JOIN author a ON a.author_id = p.author_id ",
            $($clause, " "),*
        )
    };
}

const POPULAR_POSTS_QUERY: &str = select_posts!(
    "WHERE ($1 OR EXISTS (SELECT 1 FROM post_tag pt JOIN tag t ON t.tag_id = pt.tag_id \
        WHERE pt.post_id = p.post_id AND t.title = $2))",
    "ORDER BY (SELECT count(*) FROM post_like l WHERE l.post_id = p.post_id) DESC, \
        p.published_at DESC, p.slug COLLATE \"C\" ASC",
    "LIMIT $3",
);

const FRESH_POSTS_QUERY: &str = select_posts!(
    "WHERE ($1 OR EXISTS (SELECT 1 FROM post_tag pt JOIN tag t ON t.tag_id = pt.tag_id \
        WHERE pt.post_id = p.post_id AND t.title = $2))",
    "ORDER BY p.published_at DESC, p.slug COLLATE \"C\" ASC",
    "LIMIT $3",
);

const POST_BY_SLUG_QUERY: &str = select_posts!("WHERE p.slug = $1");

#[derive(sqlx::FromRow)]
struct PostRecord {
    post_id: i64,
    slug: String,
    title: String,
    text: String,
    author: Author,
    image: Option<String>,
    published_at: DateTime<Utc>,
    tags: Option<Vec<String>>,
    comments_count: i64,
}

impl From<PostRecord> for AnnotatedPost {
    fn from(
        PostRecord {
            post_id,
            slug,
            title,
            text,
            author,
            image,
            published_at,
            tags,
            comments_count,
        }: PostRecord,
    ) -> Self {
        let tags = tags.unwrap_or_default().into_iter().map(Tag).collect();

        AnnotatedPost {
            post: Post {
                id: post_id,
                slug,
                title,
                text,
                author,
                image,
                published_at,
                tags,
            },
            comments_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagStatsRecord {
    title: String,
    posts_count: i64,
}

impl From<TagStatsRecord> for TagStats {
    fn from(TagStatsRecord { title, posts_count }: TagStatsRecord) -> Self {
        TagStats {
            tag: Tag(title),
            posts_count,
        }
    }
}

fn sql_limit(limit: usize) -> Result<i64> {
    i64::try_from(limit).map_err(|_| Error::InvalidInput)
}

pub async fn migrate<'a, A>(migrator: A) -> Result<()>
where
    A: Acquire<'a>,
    <A::Connection as Deref>::Target: Migrate,
{
    migrate!()
        .run(migrator)
        .await
        .map_err(sqlx::Error::from)
        .map_err(Error::from)
}

pub async fn get_ranked_posts<'c, E: PgExecutor<'c>>(
    ranking: PostRanking,
    tag: Option<&Tag>,
    limit: usize,
    executor: E,
) -> Result<Vec<AnnotatedPost>> {
    let sql = match ranking {
        PostRanking::Popular => POPULAR_POSTS_QUERY,
        PostRanking::Fresh => FRESH_POSTS_QUERY,
    };
    let no_tag_filtering = tag.is_none();

    query_as::<_, PostRecord>(sql)
        .bind(no_tag_filtering)
        .bind(tag.map(|Tag(tag)| tag.as_str()).unwrap_or_default())
        .bind(sql_limit(limit)?)
        .fetch(executor)
        .map_ok(AnnotatedPost::from)
        .try_collect()
        .await
        .map_err(Error::from)
}

pub async fn get_post_by_slug<'c, E: PgExecutor<'c>>(
    slug: &str,
    executor: E,
) -> Result<Option<Post>> {
    let record = query_as::<_, PostRecord>(POST_BY_SLUG_QUERY)
        .bind(slug)
        .fetch_optional(executor)
        .await?;

    Ok(record.map(|record| AnnotatedPost::from(record).post))
}

/// Comments of a post, oldest first, with their authors joined in.
pub async fn get_comments_for_post<'c, E: PgExecutor<'c>>(
    post_id: i64,
    executor: E,
) -> Result<Vec<Comment>> {
    query_as::<_, Comment>(
        "SELECT c.text, a.username AS author, c.published_at \
        FROM comment c JOIN author a ON a.author_id = c.author_id \
        WHERE c.post_id = $1 \
        ORDER BY c.published_at ASC, c.comment_id ASC",
    )
    .bind(post_id)
    .fetch(executor)
    .try_collect()
    .await
    .map_err(Error::from)
}

pub async fn get_like_count<'c, E: PgExecutor<'c>>(post_id: i64, executor: E) -> Result<i64> {
    query_scalar::<_, i64>("SELECT count(*) FROM post_like WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(executor)
        .await
        .map_err(Error::from)
}

pub async fn get_popular_tags<'c, E: PgExecutor<'c>>(
    limit: usize,
    executor: E,
) -> Result<Vec<TagStats>> {
    query_as::<_, TagStatsRecord>(
        "SELECT t.title, count(pt.post_id) AS posts_count \
        FROM tag t LEFT JOIN post_tag pt ON pt.tag_id = t.tag_id \
        GROUP BY t.tag_id, t.title \
        ORDER BY posts_count DESC, t.title COLLATE \"C\" ASC \
        LIMIT $1",
    )
    .bind(sql_limit(limit)?)
    .fetch(executor)
    .map_ok(TagStats::from)
    .try_collect()
    .await
    .map_err(Error::from)
}

pub async fn get_tag_by_title<'c, E: PgExecutor<'c>>(
    title: &str,
    executor: E,
) -> Result<Option<Tag>> {
    query_scalar::<_, String>("SELECT title FROM tag WHERE title = $1")
        .bind(title)
        .fetch_optional(executor)
        .await
        .map(|title| title.map(Tag))
        .map_err(Error::from)
}
