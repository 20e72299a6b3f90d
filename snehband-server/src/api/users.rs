//! User accounts and roles

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use snehband_common::db::{users, Role, User};
use tracing::info;

use crate::api::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<User>> {
    users::get_user(&state.db, &user.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Current user not found".to_string()))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<User>>> {
    user.require(Role::Admin)?;
    Ok(Json(users::list_users(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// PATCH /api/users/:id/role
///
/// Admins cannot demote themselves, so the service always keeps one admin.
pub async fn update_role(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(request): Json<RoleRequest>,
) -> ApiResult<Json<User>> {
    user.require(Role::Admin)?;

    if id == user.id && request.role != Role::Admin {
        return Err(ApiError::Conflict("Admins cannot demote themselves".to_string()));
    }

    let updated = users::update_role(&state.db, &id, request.role)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;

    info!(user = %updated.email, role = ?updated.role, by = %user.email, "Role changed");
    Ok(Json(updated))
}
