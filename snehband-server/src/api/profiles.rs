//! Profile listing, lookup, editing and status toggling

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use snehband_common::db::{profiles, GenderFilter, Profile, ProfileDraft, ProfileFilter, Role};
use tracing::{info, warn};

use crate::api::CurrentUser;
use crate::pagination::{paginate, PAGE_SIZE};
use crate::{ApiError, ApiResult, AppState};

/// Listing query: filters plus page number
///
/// Fields are spelled out rather than flattened from [`ProfileFilter`]; the
/// query-string decoder cannot type flattened booleans.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub search: Option<String>,
    pub approved: Option<bool>,
    pub introduction: Option<bool>,
    pub gender: Option<GenderFilter>,
    pub checked_in: Option<bool>,
}

impl ListQuery {
    pub fn filter(&self) -> ProfileFilter {
        ProfileFilter {
            search: self.search.clone(),
            approved: self.approved,
            introduction: self.introduction,
            gender: self.gender,
            checked_in: self.checked_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<Profile>,
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// GET /api/profiles
pub async fn list_profiles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ProfileListResponse>> {
    user.require(Role::ReadOnly)?;

    let filter = query.filter();
    let total_results = profiles::count_profiles(&state.db, &filter).await?;
    let pagination = paginate(total_results, query.page);
    let rows =
        profiles::list_profiles(&state.db, &filter, Some(PAGE_SIZE), pagination.offset).await?;

    Ok(Json(ProfileListResponse {
        profiles: rows,
        total_results,
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
    }))
}

pub(crate) async fn load_profile(state: &AppState, id: i64) -> ApiResult<Profile> {
    profiles::get_profile(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Profile>> {
    user.require(Role::ReadOnly)?;
    Ok(Json(load_profile(&state, id).await?))
}

/// PUT /api/profiles/:id
///
/// Replaces the editable fields. The identifier in the path wins over any in
/// the body; approval and check-in are left alone.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(draft): Json<ProfileDraft>,
) -> ApiResult<Json<Profile>> {
    user.require(Role::User)?;

    let draft = draft.normalized();
    draft.validate().map_err(ApiError::BadRequest)?;

    let profile = profiles::update_profile(&state.db, id, &draft)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))?;

    info!(anubandh_id = id, by = %user.email, "Profile updated");
    Ok(Json(profile))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub approved: Option<bool>,
    pub introduction: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub anubandh_id: i64,
    pub approved: bool,
    pub introduction: bool,
    /// An introduction was requested but held back because the profile is not approved
    pub introduction_deferred: bool,
}

/// Resolve requested flags against the stored ones
///
/// Introduction only sticks on an approved profile; otherwise it is stored
/// false and reported as deferred.
pub fn resolve_status(current: &Profile, request: &StatusRequest) -> StatusResponse {
    let approved = request.approved.unwrap_or(current.approved);
    let wants_introduction = request.introduction.unwrap_or(current.introduction);

    StatusResponse {
        anubandh_id: current.anubandh_id,
        approved,
        introduction: approved && wants_introduction,
        introduction_deferred: !approved && wants_introduction,
    }
}

/// PATCH /api/profiles/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<StatusResponse>> {
    user.require(Role::User)?;

    let current = load_profile(&state, id).await?;
    let status = resolve_status(&current, &request);

    profiles::update_status(&state.db, id, status.approved, status.introduction)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))?;

    info!(
        anubandh_id = id,
        approved = status.approved,
        introduction = status.introduction,
        deferred = status.introduction_deferred,
        by = %user.email,
        "Profile status changed"
    );
    Ok(Json(status))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// DELETE /api/profiles/:id
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    user.require(Role::Admin)?;

    if !profiles::delete_profile(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Profile {} not found", id)));
    }
    info!(anubandh_id = id, by = %user.email, "Profile deleted");
    Ok(Json(DeleteResponse { deleted: 1 }))
}

/// DELETE /api/profiles
pub async fn clear_profiles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<DeleteResponse>> {
    user.require(Role::Admin)?;

    let deleted = profiles::clear_profiles(&state.db).await?;
    warn!(deleted, by = %user.email, "All profiles cleared");
    Ok(Json(DeleteResponse { deleted }))
}
