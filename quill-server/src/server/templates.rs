use crate::model::{FirstTagExt, ServerPathExt};
use askama::Template;
use axum::http::StatusCode;
use quill_common::page::{ContactsContext, HomeContext};

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub(crate) status: StatusCode,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub context: HomeContext,
}

#[derive(Template)]
#[template(path = "contacts.html")]
pub struct ContactsTemplate {
    pub context: ContactsContext,
}
