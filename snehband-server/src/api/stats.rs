//! Dashboard statistics

use axum::{extract::State, Extension, Json};
use snehband_common::db::{profiles, ProfileStats, Role};

use crate::api::CurrentUser;
use crate::{ApiResult, AppState};

/// GET /api/stats
///
/// Counts by approval, gender, introduction and check-in, plus attendee sums.
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileStats>> {
    user.require(Role::ReadOnly)?;
    Ok(Json(profiles::profile_stats(&state.db).await?))
}
