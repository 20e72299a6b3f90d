//! Confirmation e-mails with the check-in QR code

use std::collections::BTreeSet;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use snehband_common::db::{profiles, Profile, ProfileFilter, Role};
use snehband_common::email::registration_email;
use tracing::{info, warn};

use crate::api::profiles::load_profile;
use crate::api::CurrentUser;
use crate::{ApiError, ApiResult, AppState};

/// Render and send the confirmation e-mail for `profile` to `to`
pub(crate) async fn deliver_confirmation(
    state: &AppState,
    profile: &Profile,
    to: &str,
) -> snehband_common::Result<()> {
    let content = registration_email(profile, &state.config.qr.service_url)?;
    state.mailer.send(to, &content).await
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub anubandh_id: i64,
    pub to: String,
    pub sent: bool,
}

/// POST /api/email/:id
pub async fn send_one(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SendResponse>> {
    user.require(Role::User)?;

    let profile = load_profile(&state, id).await?;
    let to = profile
        .details
        .email
        .clone()
        .ok_or_else(|| ApiError::BadRequest(format!("Profile {} has no e-mail address", id)))?;

    deliver_confirmation(&state, &profile, &to).await?;
    info!(anubandh_id = id, by = %user.email, "Confirmation e-mail sent");

    Ok(Json(SendResponse {
        anubandh_id: id,
        to,
        sent: true,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BulkEmailRequest {
    /// Explicit recipients; all profiles when absent
    pub ids: Option<Vec<i64>>,
    /// Only approved profiles (ignored with explicit ids)
    pub approved_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendFailure {
    pub anubandh_id: i64,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkEmailResponse {
    pub requested: usize,
    pub sent: usize,
    pub failed: Vec<SendFailure>,
}

/// POST /api/email/bulk
///
/// Every profile is attempted; failures are collected, never retried.
pub async fn send_bulk(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<BulkEmailRequest>,
) -> ApiResult<Json<BulkEmailResponse>> {
    user.require(Role::User)?;

    let mut failed = Vec::new();
    let (requested, targets) = match request.ids {
        Some(ids) => {
            let ids: BTreeSet<i64> = ids.into_iter().collect();
            let ids: Vec<i64> = ids.into_iter().collect();
            let found = profiles::profiles_by_ids(&state.db, &ids).await?;
            for id in &ids {
                if !found.iter().any(|p| p.anubandh_id == *id) {
                    failed.push(SendFailure {
                        anubandh_id: *id,
                        error: "Profile not found".to_string(),
                    });
                }
            }
            (ids.len(), found)
        }
        None => {
            let filter = ProfileFilter {
                approved: request.approved_only.then_some(true),
                ..Default::default()
            };
            let all = profiles::list_profiles(&state.db, &filter, None, 0).await?;
            (all.len(), all)
        }
    };

    let sends = targets.iter().map(|profile| {
        let state = &state;
        async move {
            let result = match profile.details.email.as_deref() {
                Some(to) => deliver_confirmation(state, profile, to)
                    .await
                    .map_err(|e| e.to_string()),
                None => Err("No e-mail address".to_string()),
            };
            (profile.anubandh_id, result)
        }
    });

    let mut sent = 0;
    for (anubandh_id, result) in join_all(sends).await {
        match result {
            Ok(()) => sent += 1,
            Err(error) => {
                warn!(anubandh_id, error = %error, "Bulk e-mail item failed");
                failed.push(SendFailure { anubandh_id, error });
            }
        }
    }
    failed.sort_by_key(|f| f.anubandh_id);

    info!(requested, sent, failed = failed.len(), by = %user.email, "Bulk e-mail finished");
    Ok(Json(BulkEmailResponse {
        requested,
        sent,
        failed,
    }))
}
