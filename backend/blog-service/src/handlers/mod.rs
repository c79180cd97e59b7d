/// HTTP handlers for blog-service
///
/// This module contains handlers for:
/// - Feeds: home, category and profile listings
/// - Posts: detail view and owner-only create/edit/delete forms
/// - Comments: add, edit and delete under a post
/// - Pages: static about and rules pages
/// - Health: liveness and readiness probes
///
/// Mutating handlers extract [`AuthUser`](crate::middleware::AuthUser) first,
/// so anonymous actors are redirected to login before anything else runs.
pub mod comments;
pub mod feed;
pub mod health;
pub mod pages;
pub mod posts;

// Re-export handler functions at module level
pub use comments::{
    add_comment, delete_comment, delete_comment_form, edit_comment, edit_comment_form,
};
pub use feed::{category_posts, index, profile};
pub use health::{health_check, liveness_check, readiness_check};
pub use pages::{about, rules};
pub use posts::{
    create_post, create_post_form, delete_post, delete_post_form, edit_post, edit_post_form,
    post_detail,
};

use actix_web::{http::header, HttpResponse};
use maud::Markup;

use crate::error::AppError;
use crate::middleware::CsrfToken;

/// 200 page, issuing the CSRF cookie when the token is fresh.
pub(crate) fn page(markup: Markup, csrf: Option<&CsrfToken>) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.content_type("text/html; charset=utf-8");
    if let Some(cookie) = csrf.and_then(CsrfToken::cookie) {
        builder.cookie(cookie);
    }
    builder.body(markup.into_string())
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::not_found("no route"))
}
