//! Tests for the POST /payments/intents endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::*;

fn intent_request(token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/payments/intents")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_create_intent_without_credential_is_unauthorized() {
    let state = create_test_app_state();
    let app = payments_app(state);

    let body = json!({"invoice_id": "om_inv_x", "amount": 125.0});
    let response = app.oneshot(intent_request(None, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_intent_with_nonpositive_amount_is_rejected() {
    let state = create_test_app_state();
    let raw = {
        let conn = state.db.get().unwrap();
        create_test_user_with_key(&conn, "ops@example.com").1
    };
    let app = payments_app(state);

    let body = json!({"invoice_id": "om_inv_x", "amount": 0.0});
    let response = app.oneshot(intent_request(Some(&raw), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_intent_for_unknown_invoice_is_not_found() {
    let state = create_test_app_state();
    let raw = {
        let conn = state.db.get().unwrap();
        create_test_user_with_key(&conn, "ops@example.com").1
    };
    let app = payments_app(state);

    let body = json!({"invoice_id": "om_inv_does_not_exist", "amount": 125.0});
    let response = app.oneshot(intent_request(Some(&raw), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_intent_writes_no_record_when_processor_unreachable() {
    // The pending payment record is only written after the processor
    // returns an intent.
    let state = create_test_app_state();
    let (raw, invoice_id) = {
        let conn = state.db.get().unwrap();
        let (_, raw) = create_test_user_with_key(&conn, "ops@example.com");
        let invoice = create_test_invoice(&conn);
        (raw, invoice.id)
    };
    let app = payments_app(state.clone());

    let body = json!({"invoice_id": invoice_id, "amount": 125.0});
    let response = app.oneshot(intent_request(Some(&raw), &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let conn = state.db.get().unwrap();
    let record = queries::latest_succeeded_payment_record(&conn, &invoice_id).unwrap();
    assert!(record.is_none());
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM payment_records WHERE invoice_id = ?1",
            [&invoice_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}
