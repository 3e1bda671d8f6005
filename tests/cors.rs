//! Preflight CORS tests for the payment endpoints.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

mod common;
use common::*;

#[tokio::test]
async fn test_preflight_is_answered_without_credentials() {
    let state = create_test_app_state();
    let app = payments_app(state);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/payments/refunds")
        .header("Origin", "https://omega.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization, content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Preflight succeeds even though no bearer credential is present.
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let allow_headers = headers
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();
    assert!(allow_headers.contains("authorization"));
    assert!(allow_headers.contains("x-client-info"));
    assert!(allow_headers.contains("apikey"));
    assert!(allow_headers.contains("content-type"));

    let allow_methods = headers
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(allow_methods.contains("POST"));
}

#[tokio::test]
async fn test_actual_response_carries_allow_origin() {
    let state = create_test_app_state();
    let app = payments_app(state);

    let request = Request::builder()
        .method("POST")
        .uri("/payments/refunds")
        .header("Origin", "https://omega.example")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // The request itself is unauthorized, but the CORS header is present
    // so the browser can read the error body.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
