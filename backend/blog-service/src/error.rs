/// Error types for Blog Service
///
/// Every handler returns `Result<HttpResponse, AppError>`. The variants map
/// onto the externally visible surfaces: rendered error pages for 404/403/500
/// and plain redirects for the unauthenticated and non-owner cases.
use actix_web::{
    dev::ServiceResponse,
    http::{header, StatusCode},
    middleware::ErrorHandlerResponse,
    HttpResponse, ResponseError,
};
use thiserror::Error;

use crate::render;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing entity, or an entity hidden by the visibility filter
    #[error("Not found: {0}")]
    NotFound(String),

    /// Actor is not the owner; answered with a redirect to a neutral page
    #[error("Not the owner, redirecting to {fallback}")]
    NotOwner { fallback: String },

    /// No session; answered with a redirect to the login flow
    #[error("Authentication required")]
    Unauthenticated { login_url: String },

    /// Double-submit token missing or mismatched
    #[error("CSRF verification failed: {0}")]
    CsrfFailure(String),

    /// Form body that could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Form body over the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Unique constraint violated (duplicate slug or username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotOwner { .. } | AppError::Unauthenticated { .. } => StatusCode::FOUND,
            AppError::CsrfFailure(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::NotOwner { fallback } => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, fallback.as_str()))
                    .finish();
            }
            AppError::Unauthenticated { login_url } => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, login_url.as_str()))
                    .finish();
            }
            AppError::Database(msg) | AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed with server error");
            }
            AppError::CsrfFailure(reason) => {
                tracing::warn!(%reason, "CSRF verification failed");
            }
            _ => {}
        }

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(render::error_page(status).into_string())
    }
}

/// `ErrorHandlers` fallback: error responses produced outside `AppError`
/// (method mismatch, framework extractors, panicking services) get the
/// rendered page for their status. HTML bodies are passed through.
pub fn render_error_response<B>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |ct| ct.starts_with("text/html"));
    if is_html {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let status = res.status();
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), path = %res.request().path(), "unhandled server error");
    }
    let (req, _) = res.into_parts();
    let response = HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(render::error_page(status).into_string());
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::not_found("post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::CsrfFailure("missing".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::NotOwner {
                fallback: "/posts/1/".into()
            }
            .status_code(),
            StatusCode::FOUND
        );
    }

    #[test]
    fn test_not_owner_redirects_to_fallback() {
        let resp = AppError::NotOwner {
            fallback: "/posts/5/".into(),
        }
        .error_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/posts/5/"
        );
    }

    #[test]
    fn test_error_pages_are_distinct() {
        let body = |err: AppError| {
            let bytes = err.error_response().into_body().try_into_bytes().unwrap();
            String::from_utf8(bytes.to_vec()).unwrap()
        };

        let not_found = body(AppError::not_found("x"));
        let forbidden = body(AppError::CsrfFailure("x".into()));
        let server = body(AppError::Internal("x".into()));

        assert!(not_found.contains("404"));
        assert!(forbidden.contains("403"));
        assert!(server.contains("500"));
        assert_ne!(not_found, forbidden);
        assert_ne!(forbidden, server);

        let too_large = body(AppError::PayloadTooLarge("x".into()));
        assert!(too_large.contains("413"));
    }

    #[actix_rt::test]
    async fn test_plain_error_responses_get_rendered_page() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let plain = ServiceResponse::new(
            req,
            HttpResponse::InternalServerError()
                .content_type("text/plain")
                .body("boom"),
        );

        let res = match render_error_response(plain).unwrap() {
            ErrorHandlerResponse::Response(res) => res,
            ErrorHandlerResponse::Future(_) => panic!("expected a ready response"),
        };
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::test::read_body(res).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Server error"));
        assert!(!body.contains("boom"));
    }

    #[actix_rt::test]
    async fn test_rendered_error_pages_pass_through() {
        let req = actix_web::test::TestRequest::default().to_http_request();
        let page = ServiceResponse::new(req, AppError::not_found("post").error_response());

        let res = match render_error_response(page).unwrap() {
            ErrorHandlerResponse::Response(res) => res,
            ErrorHandlerResponse::Future(_) => panic!("expected a ready response"),
        };
        let body = actix_web::test::read_body(res).await;
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("Page not found"));
    }
}
