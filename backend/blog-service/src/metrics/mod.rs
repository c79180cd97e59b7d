//! Prometheus metrics for blog-service.
//!
//! Exposes request and content-mutation collectors and an HTTP handler for
//! the `/metrics` endpoint.

use actix_web::{web, HttpResponse};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

use crate::AppState;

lazy_static! {
    /// HTTP requests handled, by method and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_http_requests_total",
        "Total HTTP requests segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register blog_http_requests_total");

    /// HTTP request latency by method.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "blog_http_request_duration_seconds",
        "HTTP request duration segmented by method",
        &["method"]
    )
    .expect("failed to register blog_http_request_duration_seconds");

    /// Posts and comments created, edited or deleted.
    pub static ref CONTENT_MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_content_mutations_total",
        "Content mutations segmented by entity and action",
        &["entity", "action"]
    )
    .expect("failed to register blog_content_mutations_total");
}

pub fn observe_request(method: &str, status: u16, elapsed: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(elapsed.as_secs_f64());
}

pub fn record_mutation(entity: &str, action: &str) {
    CONTENT_MUTATIONS_TOTAL
        .with_label_values(&[entity, action])
        .inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics(state: web::Data<AppState>) -> HttpResponse {
    if let Some(pool) = &state.pool {
        db_pool::record_pool_metrics(pool, "blog-service");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
