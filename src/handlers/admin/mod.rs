mod users;

pub use users::*;

use axum::http::{HeaderName, Method, header};
use axum::{
    Router, middleware,
    routing::{get, put},
};
use tower_http::cors::{Any, CorsLayer};

use crate::db::AppState;
use crate::middleware::require_admin;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::OPTIONS])
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{user_id}/role", put(update_user_role))
        .layer(middleware::from_fn_with_state(state, require_admin))
        .layer(cors())
}
