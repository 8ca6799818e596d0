//! Request pipeline tests: bearer extraction, correlation ids, and the
//! error mapping at the transport boundary.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use uuid::Uuid;

use roost::domain::TokenKind;

use crate::common::{body_string, TestApp};

#[tokio::test]
async fn protected_route_requires_bearer() {
    let app = TestApp::new();

    let response = app.get("/api/v1/users/@me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("missing authorization header"));
}

#[tokio::test]
async fn malformed_authorization_is_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            Request::builder()
                .method("GET")
                .uri("/api/v1/users/@me")
                .header("Authorization", "Token abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.contains("invalid authorization format"));
}

#[tokio::test]
async fn garbage_bearer_is_rejected() {
    let app = TestApp::new();

    let response = app.get_auth("/api/v1/users/@me", "not-a-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_tokens_cannot_authorize_requests() {
    let app = TestApp::new();

    let refresh = app
        .tokens
        .sign(TokenKind::Refresh, Uuid::now_v7(), "session", None, None)
        .unwrap();

    let response = app.get_auth("/api/v1/users/@me", &refresh).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_bearer_reaches_the_handler() {
    let app = TestApp::new();

    let access = app
        .tokens
        .sign(TokenKind::Access, Uuid::now_v7(), "session", None, None)
        .unwrap();

    // Auth passes; the unreachable test store then fails, which must surface
    // as an opaque internal error rather than an auth failure.
    let response = app.get_auth("/api/v1/users/@me", &access).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("internal server error"));
    assert!(!body.contains("postgres"));
}

#[tokio::test]
async fn public_routes_skip_auth() {
    let app = TestApp::new();

    // Validation runs before any store access, so this fails with a clean
    // 400 and no credentials attached.
    let response = app
        .post_json("/api/v1/auth/register", r#"{"username":"","password":""}"#)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::new();

    let response = app
        .request(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("x-request-id", "corr-1234")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "corr-1234"
    );
}

#[tokio::test]
async fn request_id_is_minted_when_absent() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(Uuid::parse_str(header).is_ok());
}
