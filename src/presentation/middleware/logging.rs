//! Request Logging Middleware
//!
//! One structured record per call: method, path, status, elapsed time, and
//! the caller identity when the auth layer resolved one. Also feeds the
//! HTTP metrics.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use super::request_id::RequestId;
use crate::infrastructure::metrics;

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    let user_id = response
        .extensions()
        .get::<AuthUser>()
        .map(|a| a.user_id.to_string());

    metrics::record_http_request(method.as_str(), &path, status, start.elapsed().as_secs_f64());

    if response.status().is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            user_id = user_id.as_deref().unwrap_or(""),
            request_id = %request_id,
            "request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            user_id = user_id.as_deref().unwrap_or(""),
            request_id = %request_id,
            "request handled"
        );
    }

    response
}
