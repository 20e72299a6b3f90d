//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Registrant gender; unknown is represented as `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

/// User account role
///
/// Access grows `Default` < `ReadOnly` < `User` < `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum Role {
    Admin,
    User,
    ReadOnly,
    Default,
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::Default => 0,
            Role::ReadOnly => 1,
            Role::User => 2,
            Role::Admin => 3,
        }
    }

    /// True when this role grants at least the access of `required`
    pub fn allows(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

/// Optional free-text profile fields, stored one column each
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct ProfileDetails {
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub birth_time: Option<String>,
    pub birth_place: Option<String>,
    pub education: Option<String>,
    pub occupation: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
    pub photo_url: Option<String>,
    pub gotra: Option<String>,
    pub marital_status: Option<String>,
    pub complexion: Option<String>,
    pub height: Option<String>,
    pub blood_group: Option<String>,
    pub father_name: Option<String>,
    pub father_occupation: Option<String>,
    pub mother_name: Option<String>,
    pub mother_occupation: Option<String>,
    pub parent_mobile: Option<String>,
    pub partner_education: Option<String>,
    pub partner_location: Option<String>,
    pub partner_expectations: Option<String>,
}

/// Column names of [`ProfileDetails`], in the order of [`ProfileDetails::values`]
pub const DETAIL_COLUMNS: [&str; 22] = [
    "email",
    "birth_date",
    "birth_time",
    "birth_place",
    "education",
    "occupation",
    "current_address",
    "permanent_address",
    "photo_url",
    "gotra",
    "marital_status",
    "complexion",
    "height",
    "blood_group",
    "father_name",
    "father_occupation",
    "mother_name",
    "mother_occupation",
    "parent_mobile",
    "partner_education",
    "partner_location",
    "partner_expectations",
];

impl ProfileDetails {
    /// Field values in [`DETAIL_COLUMNS`] order
    pub fn values(&self) -> [Option<&str>; 22] {
        [
            self.email.as_deref(),
            self.birth_date.as_deref(),
            self.birth_time.as_deref(),
            self.birth_place.as_deref(),
            self.education.as_deref(),
            self.occupation.as_deref(),
            self.current_address.as_deref(),
            self.permanent_address.as_deref(),
            self.photo_url.as_deref(),
            self.gotra.as_deref(),
            self.marital_status.as_deref(),
            self.complexion.as_deref(),
            self.height.as_deref(),
            self.blood_group.as_deref(),
            self.father_name.as_deref(),
            self.father_occupation.as_deref(),
            self.mother_name.as_deref(),
            self.mother_occupation.as_deref(),
            self.parent_mobile.as_deref(),
            self.partner_education.as_deref(),
            self.partner_location.as_deref(),
            self.partner_expectations.as_deref(),
        ]
    }

    /// Trim every field and turn blank values into `None`
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.email,
            &mut self.birth_date,
            &mut self.birth_time,
            &mut self.birth_place,
            &mut self.education,
            &mut self.occupation,
            &mut self.current_address,
            &mut self.permanent_address,
            &mut self.photo_url,
            &mut self.gotra,
            &mut self.marital_status,
            &mut self.complexion,
            &mut self.height,
            &mut self.blood_group,
            &mut self.father_name,
            &mut self.father_occupation,
            &mut self.mother_name,
            &mut self.mother_occupation,
            &mut self.parent_mobile,
            &mut self.partner_education,
            &mut self.partner_location,
            &mut self.partner_expectations,
        ] {
            *field = field
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
        self
    }
}

/// Registrant profile as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub anubandh_id: i64,
    pub id_synthetic: bool,
    pub name: String,
    pub mobile: String,
    pub gender: Option<Gender>,
    pub attendee_count: i64,
    pub approved: bool,
    pub introduction: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub details: ProfileDetails,
}

/// Profile content before an identifier is settled
///
/// Produced by the CSV mapper and by self-registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDraft {
    pub anubandh_id: Option<i64>,
    pub name: String,
    pub mobile: String,
    pub gender: Option<Gender>,
    pub attendee_count: i64,
    #[serde(flatten)]
    pub details: ProfileDetails,
}

impl ProfileDraft {
    /// A draft is storable when both name and mobile number are present
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [("name", &self.name), ("mobile", &self.mobile)]
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required field(s): {}", missing.join(", ")))
        }
    }

    /// Trim name, mobile and details
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.mobile = self.mobile.trim().to_string();
        self.details = self.details.normalized();
        self
    }
}

/// Gender filter for listings; `unknown` selects profiles without a gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum GenderFilter {
    #[serde(rename = "MALE", alias = "male")]
    Male,
    #[serde(rename = "FEMALE", alias = "female")]
    Female,
    #[serde(rename = "unknown", alias = "UNKNOWN")]
    Unknown,
}

/// Listing and export filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFilter {
    pub search: Option<String>,
    pub approved: Option<bool>,
    pub introduction: Option<bool>,
    pub gender: Option<GenderFilter>,
    pub checked_in: Option<bool>,
}

/// Aggregated dashboard counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct ProfileStats {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub male: i64,
    pub female: i64,
    pub unknown_gender: i64,
    pub introduction: i64,
    pub checked_in: i64,
    pub expected_attendees: i64,
    pub approved_attendees: i64,
}

/// User account, created on first sign-in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
