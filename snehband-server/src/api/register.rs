//! Public self-registration

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use snehband_common::db::{profiles, Profile, ProfileDetails, ProfileDraft};
use snehband_common::import::{derive_attendee_count, standardize_gender};
use tracing::{info, warn};

use crate::api::email::deliver_confirmation;
use crate::{ApiError, ApiResult, AppState};

/// Registration form
///
/// Gender and attendee answers are free text, normalised with the same
/// rules as imported spreadsheets.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub anubandh_id: Option<i64>,
    pub name: String,
    pub mobile: String,
    pub gender: Option<String>,
    pub attendee_count: Option<i64>,
    /// Survey answer, used when `attendee_count` is absent
    pub attendee_text: Option<String>,
    #[serde(flatten)]
    pub details: ProfileDetails,
}

impl RegisterRequest {
    pub fn into_draft(self) -> ProfileDraft {
        let attendee_count = self
            .attendee_count
            .or_else(|| self.attendee_text.as_deref().map(derive_attendee_count))
            .unwrap_or(0)
            .max(0);

        ProfileDraft {
            // Zero and negative ids are treated as absent, as in CSV import
            anubandh_id: self.anubandh_id.filter(|id| *id > 0),
            name: self.name,
            mobile: self.mobile,
            gender: self.gender.as_deref().and_then(standardize_gender),
            attendee_count,
            details: self.details,
        }
        .normalized()
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub email_sent: bool,
}

/// POST /api/register
///
/// Creates the profile (409 when the Anubandh ID exists), then sends the
/// confirmation e-mail when an address was given. A failed e-mail never
/// fails the registration.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let draft = request.into_draft();
    draft.validate().map_err(ApiError::BadRequest)?;

    let profile = match draft.anubandh_id {
        Some(id) => profiles::insert_profile(&state.db, id, false, &draft).await?,
        None => {
            // Shares the import lock so allocation never races an import
            let _guard = state.import_lock.lock().await;
            let id = profiles::next_synthetic_id(&state.db).await?;
            profiles::insert_profile(&state.db, id, true, &draft).await?
        }
    };
    info!(
        anubandh_id = profile.anubandh_id,
        synthetic = profile.id_synthetic,
        "Profile registered"
    );

    let email_sent = match profile.details.email.as_deref() {
        Some(to) => match deliver_confirmation(&state, &profile, to).await {
            Ok(()) => true,
            Err(e) => {
                warn!(anubandh_id = profile.anubandh_id, error = %e, "Confirmation e-mail not sent");
                false
            }
        },
        None => false,
    };

    Ok((StatusCode::CREATED, Json(RegisterResponse { profile, email_sent })))
}
