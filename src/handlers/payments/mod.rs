mod charges;
mod intents;
mod refunds;

pub use charges::*;
pub use intents::*;
pub use refunds::*;

use axum::http::{HeaderName, Method, header};
use axum::{Router, middleware, routing::post};
use tower_http::cors::{Any, CorsLayer};

use crate::db::AppState;
use crate::middleware::require_auth;

/// Permissive CORS for the payment endpoints: any origin, the client
/// headers the dashboard sends, POST plus preflight.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
        .allow_methods([Method::POST, Method::OPTIONS])
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments/intents", post(create_payment_intent))
        .route("/payments/charge-lookup", post(lookup_charge_id))
        .route("/payments/refunds", post(create_refund))
        .layer(middleware::from_fn_with_state(state, require_auth))
        .layer(cors())
}
