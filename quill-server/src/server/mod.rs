pub mod blog;
pub mod templates;

use crate::AppState;
use askama::Template;
use axum::extract::rejection::PathRejection;
use axum::extract::State;
use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use axum_extra::routing::{RouterExt, TypedPath};
use quill_common::page;
use quill_common::store::BlogStore;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use templates::{ContactsTemplate, ErrorTemplate, HomeTemplate};
use thiserror::Error;
use tower_http::services::ServeDir;
use tracing::error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found")]
    NotFound,
    #[error("Path rejection: {0}")]
    Path(#[from] PathRejection),
    #[error("Askama error: {0}")]
    Askama(#[from] askama::Error),
    #[error("Page error: {0}")]
    Page(#[from] page::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound | Error::Path(_) => StatusCode::NOT_FOUND,
            Error::Page(error) if error.is_not_found() => StatusCode::NOT_FOUND,
            Error::Askama(_) | Error::Page(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        match (ErrorTemplate { status }.render()) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(error) => {
                error!(%error, "Error trying to reply with error");
                (status, Html(format!("Error code {status}"))).into_response()
            }
        }
    }
}

/// Directories served next to the rendered pages.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ServedDirs {
    pub static_dir: PathBuf,
    /// Uploaded post images, served under [`quill_common::blog::MEDIA_URL`].
    pub media_dir: PathBuf,
}

pub fn router(dirs: &ServedDirs) -> Router<AppState> {
    Router::new()
        .typed_get(home)
        .typed_get(contacts)
        .merge(blog::router())
        .nest_service(
            quill_common::blog::MEDIA_URL.trim_end_matches('/'),
            ServeDir::new(&dirs.media_dir),
        )
        .fallback_service(
            ServeDir::new(&dirs.static_dir)
                .fallback((|| async { Error::NotFound }).into_service()),
        )
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(Error))]
pub struct HomePath {}

pub async fn home(
    HomePath {}: HomePath,
    State(store): State<Arc<dyn BlogStore>>,
) -> Result<Html<String>> {
    let context = page::build_home_context(&*store).await?;

    let html = HomeTemplate { context }.render()?;
    Ok(Html(html))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/contacts", rejection(Error))]
pub struct ContactsPath {}

pub async fn contacts(ContactsPath {}: ContactsPath) -> Result<Html<String>> {
    let context = page::build_contacts_context();

    let html = ContactsTemplate { context }.render()?;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::ServedDirs;
    use crate::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use quill_common::memory::{Dataset, MemoryStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let dataset: Dataset = serde_json::from_str(
            r#"{
                "tags": ["News", "Big News"],
                "posts": [
                    {
                        "slug": "hello",
                        "title": "Hello",
                        "text": "Hello **world**",
                        "author": "alice",
                        "image": "covers/hello.png",
                        "published_at": "2024-01-01T00:00:00Z",
                        "tags": ["News", "Big News"],
                        "likes": 2
                    },
                    {
                        "slug": "untagged",
                        "title": "Untagged <post>",
                        "text": "Nothing to see",
                        "author": "bob",
                        "published_at": "2024-02-01T00:00:00Z"
                    }
                ],
                "comments": [
                    {
                        "post": "hello",
                        "author": "carol",
                        "text": "Nice post",
                        "published_at": "2024-01-02T00:00:00Z"
                    }
                ]
            }"#,
        )
        .unwrap();

        let state = AppState {
            store: Arc::new(MemoryStore::new(dataset).unwrap()),
        };
        let dirs = ServedDirs {
            static_dir: "does_not_exist/static".into(),
            media_dir: "does_not_exist/media".into(),
        };

        super::router(&dirs).with_state(state)
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn home_page() {
        let (status, body) = get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hello"));
        assert!(body.contains(r#"href="/post/hello""#));
        assert!(body.contains("/media/covers/hello.png"));
        assert!(body.contains("Untagged &lt;post&gt;"));
        assert!(body.contains(r#"<p class="post-card-teaser">Nothing to see</p>"#));
        assert!(!body.contains("&hellip;"));
    }

    #[tokio::test]
    async fn post_page() {
        let (status, body) = get("/post/hello").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Hello <strong>world</strong>"));
        assert!(body.contains("Nice post"));
        assert!(body.contains("carol"));
        assert!(body.contains(r#"href="/tag/Big%20News""#));
    }

    #[tokio::test]
    async fn tag_page() {
        let (status, body) = get("/tag/Big%20News").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Big News"));
        assert!(body.contains(r#"href="/post/hello""#));
    }

    #[tokio::test]
    async fn contacts_page() {
        let (status, _) = get("/contacts").await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_pages_are_404() {
        for uri in ["/post/missing", "/tag/Missing", "/no/such/page"] {
            let (status, _) = get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }
}
