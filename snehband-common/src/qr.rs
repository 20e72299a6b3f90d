//! Check-in QR payload
//!
//! The QR code itself is rendered by an external service; the payload is a
//! small JSON object read back by the venue scanner.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::db::models::Profile;
use crate::{Error, Result};

/// JSON carried by the check-in QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub anubandh_id: i64,
    pub name: String,
    pub mobile: String,
    pub attendee_count: i64,
}

impl QrPayload {
    pub fn for_profile(profile: &Profile) -> Self {
        Self {
            anubandh_id: profile.anubandh_id,
            name: profile.name.clone(),
            mobile: profile.mobile.clone(),
            attendee_count: profile.attendee_count,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Internal(format!("QR payload: {}", e)))
    }

    /// Decode scanned text
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text.trim())
            .map_err(|e| Error::InvalidInput(format!("Unreadable QR payload: {}", e)))
    }
}

/// Render-service URL for the payload's QR image
pub fn qr_image_url(service_url: &str, payload: &QrPayload) -> Result<Url> {
    let data = payload.to_json()?;
    Url::parse_with_params(service_url, [("size", "300x300"), ("data", data.as_str())])
        .map_err(|e| Error::Config(format!("Invalid QR service URL {:?}: {}", service_url, e)))
}
