//! Venue check-in by QR scan or manual lookup

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snehband_common::db::{profiles, Role};
use snehband_common::qr::QrPayload;
use tracing::info;

use crate::api::profiles::load_profile;
use crate::api::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckInRequest {
    /// Raw scanned QR text
    pub payload: Option<String>,
    /// Manual entry when no code can be scanned
    pub anubandh_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub anubandh_id: i64,
    pub name: String,
    pub attendee_count: i64,
    pub checked_in_at: DateTime<Utc>,
    pub already_checked_in: bool,
}

/// POST /api/checkin
///
/// Only approved profiles are admitted. The first check-in time is kept on
/// repeated scans.
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CheckInRequest>,
) -> ApiResult<Json<CheckInResponse>> {
    user.require(Role::User)?;

    let scanned = request
        .payload
        .as_deref()
        .map(QrPayload::parse)
        .transpose()?;
    let id = scanned
        .as_ref()
        .map(|p| p.anubandh_id)
        .or(request.anubandh_id)
        .ok_or_else(|| ApiError::BadRequest("Provide a QR payload or an Anubandh ID".to_string()))?;

    let profile = load_profile(&state, id).await?;
    if let Some(scanned) = &scanned {
        if scanned.mobile != profile.mobile {
            return Err(ApiError::BadRequest(format!(
                "QR code does not match registration {}",
                id
            )));
        }
    }
    if !profile.approved {
        return Err(ApiError::Conflict(format!("Profile {} is not approved", id)));
    }

    let already_checked_in = profile.checked_in_at.is_some();
    let profile = profiles::mark_checked_in(&state.db, id, Utc::now())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {} not found", id)))?;
    let checked_in_at = profile
        .checked_in_at
        .ok_or_else(|| ApiError::Internal(format!("Check-in for {} was not recorded", id)))?;

    info!(anubandh_id = id, already_checked_in, by = %user.email, "Check-in");
    Ok(Json(CheckInResponse {
        anubandh_id: id,
        name: profile.name,
        attendee_count: profile.attendee_count,
        checked_in_at,
        already_checked_in,
    }))
}
