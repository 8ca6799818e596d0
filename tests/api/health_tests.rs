//! Health and metrics endpoint tests.

use axum::http::StatusCode;

use crate::common::{body_string, TestApp};

#[tokio::test]
async fn health_returns_ok() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn metrics_exposes_prometheus_text() {
    let app = TestApp::new();

    // One observed request so the HTTP counters have a sample.
    app.get("/health").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("roost_http_requests_total"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
