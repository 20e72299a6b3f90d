//! Administrative CSV import

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use snehband_common::db::{profiles, Role};
use snehband_common::import::{import_csv, ImportReport};
use tracing::info;

use crate::api::upload::read_file_field;
use crate::api::CurrentUser;
use crate::{ApiError, ApiResult, AppState, MAX_IMPORT_BYTES};

/// POST /api/profiles/import
///
/// Multipart field `file` holds the UTF-8 CSV. One import runs at a time;
/// a second request meanwhile gets 409. Synthetic identifiers continue below
/// those already stored and skip every occupied identifier.
pub async fn import_profiles(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    user.require(Role::Admin)?;

    let _guard = state
        .import_lock
        .try_lock()
        .map_err(|_| ApiError::Conflict("Another import is already running".to_string()))?;

    let file = read_file_field(&mut multipart, "file", MAX_IMPORT_BYTES).await?;
    info!(file = %file.file_name, size = file.bytes.len(), by = %user.email, "CSV import started");

    let ids = profiles::synthetic_ids(&state.db).await?;
    let report = import_csv(&state.db, &file.bytes, ids).await?;

    Ok(Json(report))
}
