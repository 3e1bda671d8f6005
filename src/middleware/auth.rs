use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::models::{ProfileRole, User};
use crate::util::extract_bearer_token;

/// Identity of the authenticated caller, inserted into request extensions
/// by the auth middlewares.
#[derive(Clone)]
pub struct AuthContext {
    pub user: User,
}

/// Resolve the bearer credential to a user.
///
/// The guard runs before anything else in every handler chain: a missing
/// or unknown credential returns 401 without touching the processor or
/// any domain table.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, StatusCode> {
    let token = extract_bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    queries::get_user_by_api_key(&conn, token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)
}

/// Two-tier admin check: the static email allow-list, or an admin role
/// flag on the user's profile row.
fn is_admin(state: &AppState, user: &User) -> Result<bool, StatusCode> {
    if state.admin_emails.iter().any(|e| e == &user.email) {
        return Ok(true);
    }

    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let profile = queries::get_profile_by_user(&conn, &user.id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(matches!(profile, Some(p) if p.role == ProfileRole::Admin))
}

/// Require an authenticated caller.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&state, request.headers())?;

    request.extensions_mut().insert(AuthContext { user });
    Ok(next.run(request).await)
}

/// Require an authenticated caller who passes the two-tier admin check.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&state, request.headers())?;

    if !is_admin(&state, &user)? {
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(AuthContext { user });
    Ok(next.run(request).await)
}
