//! Double-submit CSRF protection.
//!
//! Pages with forms embed the token from the `csrftoken` cookie (issuing a
//! fresh one when the browser has none) and every POST handler checks the
//! submitted `csrfmiddlewaretoken` field against that cookie.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{Error, FromRequest, HttpRequest};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::future::{ready, Ready};

use crate::error::{AppError, Result};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

const TOKEN_LEN: usize = 32;

/// Token to embed in a rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    value: String,
    issued: bool,
}

impl CsrfToken {
    pub fn generate() -> Self {
        let value = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        Self {
            value,
            issued: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cookie to attach when the token was minted for this response.
    pub fn cookie(&self) -> Option<Cookie<'static>> {
        self.issued.then(|| {
            Cookie::build(CSRF_COOKIE, self.value.clone())
                .path("/")
                .same_site(SameSite::Lax)
                .finish()
        })
    }
}

fn well_formed(value: &str) -> bool {
    value.len() == TOKEN_LEN && value.chars().all(|c| c.is_ascii_alphanumeric())
}

impl FromRequest for CsrfToken {
    type Error = Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let token = match req.cookie(CSRF_COOKIE) {
            Some(cookie) if well_formed(cookie.value()) => CsrfToken {
                value: cookie.value().to_string(),
                issued: false,
            },
            _ => CsrfToken::generate(),
        };
        ready(Ok(token))
    }
}

/// Compare the submitted form field against the cookie.
pub fn verify(req: &HttpRequest, submitted: &str) -> Result<()> {
    let cookie = req
        .cookie(CSRF_COOKIE)
        .ok_or_else(|| AppError::CsrfFailure("CSRF cookie not set".to_string()))?;

    if submitted.is_empty() {
        return Err(AppError::CsrfFailure("CSRF token missing".to_string()));
    }
    if !constant_time_eq(cookie.value().as_bytes(), submitted.as_bytes()) {
        return Err(AppError::CsrfFailure("CSRF token incorrect".to_string()));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_generated_token_is_issued_once() {
        let token = CsrfToken::generate();
        assert!(well_formed(token.value()));
        assert!(token.cookie().is_some());
        assert_ne!(token.value(), CsrfToken::generate().value());
    }

    #[test]
    fn test_verify_matches_cookie() {
        let value = "a".repeat(TOKEN_LEN);
        let req = TestRequest::default()
            .cookie(Cookie::new(CSRF_COOKIE, value.clone()))
            .to_http_request();

        assert!(verify(&req, &value).is_ok());
        assert!(matches!(
            verify(&req, "b"),
            Err(AppError::CsrfFailure(_))
        ));
        assert!(matches!(verify(&req, ""), Err(AppError::CsrfFailure(_))));
    }

    #[test]
    fn test_verify_without_cookie_fails() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            verify(&req, "anything"),
            Err(AppError::CsrfFailure(_))
        ));
    }
}
