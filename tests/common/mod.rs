//! Test utilities and fixtures for OMEGA integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use omega_payments::db::{AppState, init_db, queries};
pub use omega_payments::handlers;
pub use omega_payments::models::*;
pub use omega_payments::payments::ProcessorClient;

/// Processor endpoint that nothing listens on: any request that reaches
/// the processor fails fast with a connection error, so tests exercise
/// everything up to (and including) the upstream-failure path without
/// touching the network.
pub const UNREACHABLE_PROCESSOR: &str = "http://127.0.0.1:1";

/// Create an AppState for testing with an in-memory database.
///
/// Pool size 1 so every `get()` sees the same in-memory database.
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_admins(vec![])
}

/// Same as [`create_test_app_state`] but with a static admin allow-list.
pub fn create_test_app_state_with_admins(admin_emails: Vec<String>) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        processor: ProcessorClient::with_base_url("sk_test_xxx", UNREACHABLE_PROCESSOR),
        admin_emails,
        base_url: "http://localhost:3000".to_string(),
    }
}

/// Router with the payment endpoints (auth middleware included)
pub fn payments_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::payments::router(state.clone()))
        .with_state(state)
}

/// Router with the admin endpoints (admin middleware included)
pub fn admin_app(state: AppState) -> Router {
    Router::new()
        .merge(handlers::admin::router(state.clone()))
        .with_state(state)
}

/// Create a test user
pub fn create_test_user(conn: &Connection, email: &str, name: &str) -> User {
    queries::create_user(
        conn,
        &CreateUser {
            email: email.to_string(),
            name: name.to_string(),
        },
    )
    .expect("Failed to create test user")
}

/// Create a test user with an API key. Returns the user and the raw key.
pub fn create_test_user_with_key(conn: &Connection, email: &str) -> (User, String) {
    let user = create_test_user(conn, email, "Test User");
    let (_, raw) =
        queries::create_api_key(conn, &user.id, "Test").expect("Failed to create test API key");
    (user, raw)
}

/// Create a test user with an admin profile and an API key.
pub fn create_test_admin(conn: &Connection, email: &str) -> (User, String) {
    let (user, raw) = create_test_user_with_key(conn, email);
    queries::upsert_profile_role(conn, &user.id, ProfileRole::Admin)
        .expect("Failed to set admin role");
    (user, raw)
}

/// Create a test invoice
pub fn create_test_invoice(conn: &Connection) -> Invoice {
    queries::create_invoice(
        conn,
        &CreateInvoice {
            customer_name: "Test Customer".to_string(),
            customer_email: "customer@example.com".to_string(),
            amount_cents: 25_000,
            currency: "usd".to_string(),
        },
    )
    .expect("Failed to create test invoice")
}

/// Create a payment record with the given processor reference and status
pub fn create_test_payment_record(
    conn: &Connection,
    invoice_id: &str,
    processor_ref: &str,
    status: PaymentStatus,
) -> PaymentRecord {
    queries::create_payment_record(conn, invoice_id, processor_ref, status, 25_000)
        .expect("Failed to create test payment record")
}
