//! PDF export of the filtered profile list

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use snehband_common::db::{profiles, GenderFilter, ProfileFilter, Role};
use snehband_common::export::{export_pdf as render_export, ExportLayout};
use tracing::info;

use crate::api::CurrentUser;
use crate::{ApiResult, AppState};

/// Layout plus the listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub layout: ExportLayout,
    pub search: Option<String>,
    pub approved: Option<bool>,
    pub introduction: Option<bool>,
    pub gender: Option<GenderFilter>,
    pub checked_in: Option<bool>,
}

/// GET /api/profiles/export.pdf
pub async fn export_pdf(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    user.require(Role::ReadOnly)?;

    let filter = ProfileFilter {
        search: query.search,
        approved: query.approved,
        introduction: query.introduction,
        gender: query.gender,
        checked_in: query.checked_in,
    };
    let rows = profiles::list_profiles(&state.db, &filter, None, 0).await?;

    let fonts = state.fonts.clone();
    let layout = query.layout;
    let count = rows.len();
    let bytes = tokio::task::spawn_blocking(move || render_export(layout, &rows, &fonts))
        .await
        .map_err(|e| crate::ApiError::Internal(format!("PDF task failed: {}", e)))??;

    info!(profiles = count, layout = ?layout, size = bytes.len(), "PDF exported");

    let file_name = match layout {
        ExportLayout::Roster => "snehband-roster.pdf",
        ExportLayout::Cards => "snehband-profiles.pdf",
    };
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}
