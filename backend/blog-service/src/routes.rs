//! Route configuration
//!
//! The full route table plus the path builders used for redirects and links.
//! Numeric segments are matched with `\d+` so that `/posts/create/` never
//! collides with `/posts/{id}/`. Every pattern ends in a slash because
//! `NormalizePath` appends one to incoming paths (so `/metrics` still hits
//! `/metrics/`).

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;
use crate::handlers;
use crate::metrics;

pub const POST_CREATE_PATH: &str = "/posts/create/";
pub const ABOUT_PATH: &str = "/pages/about/";
pub const RULES_PATH: &str = "/pages/rules/";

/// Upper bound for urlencoded form bodies (2.5 MiB).
pub const FORM_BODY_LIMIT: usize = 2_621_440;

pub fn post_detail_path(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn post_edit_path(post_id: i64) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn post_delete_path(post_id: i64) -> String {
    format!("/posts/{}/delete/", post_id)
}

pub fn comment_create_path(post_id: i64) -> String {
    format!("/posts/{}/comment/", post_id)
}

pub fn comment_edit_path(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/edit_comment/{}/", post_id, comment_id)
}

pub fn comment_delete_path(post_id: i64, comment_id: i64) -> String {
    format!("/posts/{}/delete_comment/{}/", post_id, comment_id)
}

pub fn profile_path(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn category_path(slug: &str) -> String {
    format!("/category/{}/", urlencoding::encode(slug))
}

/// Path segments that fail to parse (e.g. an id overflowing i64) are 404s.
fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::not_found(err.to_string()).into()
}

/// Form bodies that fail to decode get rendered error pages. A POST that is
/// not a form submission cannot carry the CSRF field, so it is a CSRF failure.
fn form_error_handler(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    let app_err = match &err {
        error::UrlencodedError::ContentType => {
            AppError::CsrfFailure("request body is not a form submission".to_string())
        }
        error::UrlencodedError::Overflow { .. } | error::UrlencodedError::UnknownLength => {
            AppError::PayloadTooLarge(err.to_string())
        }
        _ => AppError::BadRequest(err.to_string()),
    };
    app_err.into()
}

/// Configure all routes for the application
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(
            web::FormConfig::default()
                .limit(FORM_BODY_LIMIT)
                .error_handler(form_error_handler),
        )
        // Operational endpoints
        .route("/health/", web::get().to(handlers::health_check))
        .route("/health/ready/", web::get().to(handlers::readiness_check))
        .route("/health/live/", web::get().to(handlers::liveness_check))
        .route("/metrics/", web::get().to(metrics::serve_metrics))
        // Feeds
        .route("/", web::get().to(handlers::index))
        .route("/category/{slug}/", web::get().to(handlers::category_posts))
        .route("/profile/{username}/", web::get().to(handlers::profile))
        // Static pages
        .route(ABOUT_PATH, web::get().to(handlers::about))
        .route(RULES_PATH, web::get().to(handlers::rules))
        // Posts
        .service(
            web::resource(POST_CREATE_PATH)
                .route(web::get().to(handlers::create_post_form))
                .route(web::post().to(handlers::create_post)),
        )
        .route(r"/posts/{id:\d+}/", web::get().to(handlers::post_detail))
        .service(
            web::resource(r"/posts/{id:\d+}/edit/")
                .route(web::get().to(handlers::edit_post_form))
                .route(web::post().to(handlers::edit_post)),
        )
        .service(
            web::resource(r"/posts/{id:\d+}/delete/")
                .route(web::get().to(handlers::delete_post_form))
                .route(web::post().to(handlers::delete_post)),
        )
        // Comments
        .route(
            r"/posts/{id:\d+}/comment/",
            web::post().to(handlers::add_comment),
        )
        .service(
            web::resource(r"/posts/{id:\d+}/edit_comment/{comment_id:\d+}/")
                .route(web::get().to(handlers::edit_comment_form))
                .route(web::post().to(handlers::edit_comment)),
        )
        .service(
            web::resource(r"/posts/{id:\d+}/delete_comment/{comment_id:\d+}/")
                .route(web::get().to(handlers::delete_comment_form))
                .route(web::post().to(handlers::delete_comment)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(post_detail_path(3), "/posts/3/");
        assert_eq!(comment_edit_path(3, 8), "/posts/3/edit_comment/8/");
        assert_eq!(profile_path("jane doe"), "/profile/jane%20doe/");
        assert_eq!(category_path("travel"), "/category/travel/");
    }

    #[test]
    fn test_form_errors_map_to_rendered_statuses() {
        use actix_web::ResponseError;

        let req = actix_web::test::TestRequest::default().to_http_request();
        let status = |err| form_error_handler(err, &req).as_response_error().status_code();

        assert_eq!(
            status(error::UrlencodedError::ContentType),
            actix_web::http::StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(error::UrlencodedError::Overflow { size: 10, limit: 5 }),
            actix_web::http::StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status(error::UrlencodedError::Chunked),
            actix_web::http::StatusCode::BAD_REQUEST
        );
    }
}
