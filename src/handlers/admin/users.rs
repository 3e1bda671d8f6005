use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::models::{ProfileRole, UserWithProfile};
use crate::pagination::{Paginated, PaginationQuery};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    /// Filter by email (exact match)
    pub email: Option<String>,
}

impl UserQuery {
    fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// GET /admin/users
///
/// List identities merged with their profile rows.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Paginated<UserWithProfile>>> {
    let conn = state.db.get()?;

    // If email filter provided, return at most a single result
    if let Some(email) = &query.email {
        let user = queries::get_user_by_email(&conn, email)?;
        return Ok(Json(match user {
            Some(user) => {
                let merged = queries::get_user_with_profile(&conn, &user.id)?
                    .ok_or_else(|| AppError::Internal("Failed to fetch user".into()))?;
                Paginated::new(vec![merged], 1, 1, 0)
            }
            None => Paginated::new(vec![], 0, 1, 0),
        }));
    }

    let pagination = query.pagination();
    let limit = pagination.limit();
    let offset = pagination.offset();
    let (users, total) = queries::list_users_with_profiles_paginated(&conn, limit, offset)?;

    Ok(Json(Paginated::new(users, total, limit, offset)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// PUT /admin/users/{user_id}/role
///
/// Upsert a role onto the user's profile row.
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<UserWithProfile>> {
    let role: ProfileRole = request.role.parse()?;

    let conn = state.db.get()?;
    let user = queries::get_user_by_id(&conn, &user_id)?.or_not_found(msg::USER_NOT_FOUND)?;

    queries::upsert_profile_role(&conn, &user.id, role)?;

    let merged = queries::get_user_with_profile(&conn, &user.id)?
        .ok_or_else(|| AppError::Internal("Failed to fetch user after role update".into()))?;

    Ok(Json(merged))
}
