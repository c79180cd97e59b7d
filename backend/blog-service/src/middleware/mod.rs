/// HTTP middleware utilities for blog-service
///
/// Provides session identity (JWT issued by the external login flow),
/// CSRF double-submit checks and request metrics. Identity never rejects a
/// request: handlers decide whether an anonymous viewer is acceptable by
/// extracting either [`Viewer`] or [`AuthUser`].
pub mod csrf;
pub mod permissions;

pub use csrf::CsrfToken;
pub use permissions::{ensure_owner, is_owner};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AuthConfig;
use crate::db::{BlogStore, UserRepository};
use crate::error::AppError;
use crate::metrics;
use crate::models::User;
use crate::AppState;

// =====================================================================
// Session identity
// =====================================================================

/// Claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated actor stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Issue a session token for `user`. Used by the login flow and tests.
pub fn encode_session_token(
    secret: &str,
    user: &User,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a session token; `None` for anything invalid or expired.
pub fn decode_session_token(secret: &str, token: &str) -> Option<SessionClaims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .ok()
}

fn session_token(req: &ServiceRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Resolves the session token to a live user and stores it as [`AuthUser`].
pub struct IdentityMiddleware {
    auth: Arc<AuthConfig>,
    store: Arc<dyn BlogStore>,
}

impl IdentityMiddleware {
    pub fn new(auth: AuthConfig, store: Arc<dyn BlogStore>) -> Self {
        Self {
            auth: Arc::new(auth),
            store,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service: Rc::new(service),
            auth: self.auth.clone(),
            store: self.store.clone(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: Rc<S>,
    auth: Arc<AuthConfig>,
    store: Arc<dyn BlogStore>,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let store = self.store.clone();
        let claims = session_token(&req, &self.auth.session_cookie)
            .and_then(|token| decode_session_token(&self.auth.session_secret, &token));

        Box::pin(async move {
            if let Some(user_id) = claims.and_then(|c| c.sub.parse::<i64>().ok()) {
                // Tokens outlive deleted accounts; those fall back to anonymous.
                match store.find_user_by_id(user_id).await {
                    Ok(Some(user)) => {
                        req.extensions_mut().insert(AuthUser {
                            id: user.id,
                            username: user.username,
                        });
                    }
                    Ok(None) => {
                        tracing::debug!(user_id, "session refers to a deleted user");
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            service.call(req).await
        })
    }
}

/// Current viewer, anonymous or authenticated. Never fails.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<AuthUser>().cloned())))
    }
}

/// Requires a session; anonymous requests are redirected to the login URL
/// with the current path as `next`.
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthUser>().cloned();
        ready(user.ok_or_else(|| {
            let next = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| req.path());
            let login_url = match req.app_data::<web::Data<AppState>>() {
                Some(state) => state.config.auth.login_redirect(next),
                None => AuthConfig::default().login_redirect(next),
            };
            Error::from(AppError::Unauthenticated { login_url })
        }))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let status = match &res {
                Ok(resp) => resp.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let elapsed = start.elapsed();
            metrics::observe_request(&method, status.as_u16(), elapsed);
            tracing::debug!(
                %method,
                %path,
                status = status.as_u16(),
                elapsed_ms = elapsed.as_millis() as u64,
                "request completed"
            );
            res
        })
    }
}
