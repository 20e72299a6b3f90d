//! Spreadsheet header → profile field mapping
//!
//! Registration spreadsheets are exported from a Marathi form, so column
//! headers are Marathi with occasional English variants. Each field lists the
//! headers it accepts. Matching is exact after trimming the cell, except for
//! fields marked [`HeaderMatch::Whitespace`], whose headers are compared after
//! collapsing internal whitespace runs.

use csv::StringRecord;

use crate::db::models::ProfileDetails;

/// Canonical profile field a column can feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    AnubandhId,
    Name,
    Mobile,
    Email,
    Gender,
    BirthDate,
    BirthTime,
    BirthPlace,
    Education,
    Occupation,
    CurrentAddress,
    PermanentAddress,
    Photo,
    Gotra,
    MaritalStatus,
    Complexion,
    Height,
    BloodGroup,
    FatherName,
    FatherOccupation,
    MotherName,
    MotherOccupation,
    ParentMobile,
    PartnerEducation,
    PartnerLocation,
    PartnerExpectations,
    /// Free-text answer from which the attendee count is derived
    AttendeeSurvey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMatch {
    Exact,
    Whitespace,
}

#[derive(Debug)]
pub struct FieldSpec {
    pub field: ProfileField,
    pub headers: &'static [&'static str],
    pub matching: HeaderMatch,
}

const fn exact(field: ProfileField, headers: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        field,
        headers,
        matching: HeaderMatch::Exact,
    }
}

/// Known headers per field
pub const FIELD_SPECS: &[FieldSpec] = &[
    exact(
        ProfileField::AnubandhId,
        &["अनुबंध आयडी", "अनुबंध क्रमांक", "Anubandh ID", "anubandhId"],
    ),
    exact(ProfileField::Name, &["संपूर्ण नाव", "नाव", "Full Name", "Name", "name"]),
    exact(
        ProfileField::Mobile,
        &["मोबाईल नंबर", "मोबाईल क्रमांक", "Mobile Number", "Mobile", "mobile"],
    ),
    exact(ProfileField::Email, &["ई-मेल", "ईमेल", "Email Address", "Email", "email"]),
    FieldSpec {
        field: ProfileField::Gender,
        headers: &["लिंग", "लिंग (Gender)", "Gender", "gender"],
        matching: HeaderMatch::Whitespace,
    },
    exact(ProfileField::BirthDate, &["जन्म तारीख", "जन्मतारीख", "Date of Birth"]),
    exact(ProfileField::BirthTime, &["जन्म वेळ", "Birth Time"]),
    exact(ProfileField::BirthPlace, &["जन्म स्थळ", "जन्मस्थळ", "Birth Place"]),
    FieldSpec {
        field: ProfileField::Education,
        headers: &["शिक्षण", "शैक्षणिक पात्रता", "Education", "education"],
        matching: HeaderMatch::Whitespace,
    },
    exact(ProfileField::Occupation, &["नोकरी / व्यवसाय", "व्यवसाय", "Occupation"]),
    exact(ProfileField::CurrentAddress, &["सध्याचा पत्ता", "Current Address"]),
    exact(ProfileField::PermanentAddress, &["कायमचा पत्ता", "Permanent Address"]),
    exact(ProfileField::Photo, &["फोटो", "Photo", "photo"]),
    exact(ProfileField::Gotra, &["गोत्र", "Gotra"]),
    exact(ProfileField::MaritalStatus, &["वैवाहिक स्थिती", "Marital Status"]),
    exact(ProfileField::Complexion, &["वर्ण", "Complexion"]),
    exact(ProfileField::Height, &["उंची", "Height"]),
    exact(ProfileField::BloodGroup, &["रक्तगट", "Blood Group"]),
    exact(ProfileField::FatherName, &["वडिलांचे नाव", "Father's Name"]),
    exact(ProfileField::FatherOccupation, &["वडिलांचा व्यवसाय", "Father's Occupation"]),
    exact(ProfileField::MotherName, &["आईचे नाव", "Mother's Name"]),
    exact(ProfileField::MotherOccupation, &["आईचा व्यवसाय", "Mother's Occupation"]),
    exact(ProfileField::ParentMobile, &["पालकांचा मोबाईल नंबर", "Parent Mobile"]),
    exact(ProfileField::PartnerEducation, &["अपेक्षित जोडीदाराचे शिक्षण", "Partner Education"]),
    exact(ProfileField::PartnerLocation, &["अपेक्षित जोडीदाराचे ठिकाण", "Partner Location"]),
    exact(ProfileField::PartnerExpectations, &["जोडीदाराविषयी अपेक्षा", "Partner Expectations"]),
    exact(
        ProfileField::AttendeeSurvey,
        &[
            "मेळाव्यास उपस्थित राहणाऱ्या व्यक्तींची संख्या",
            "नोंदणी शुल्क",
            "Attendees",
            "Registration Fee",
        ],
    ),
];

/// Collapse whitespace runs to a single space and trim both ends
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_header(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

impl FieldSpec {
    fn accepts(&self, header: &str) -> bool {
        let header = clean_header(header);
        match self.matching {
            HeaderMatch::Exact => self.headers.iter().any(|h| *h == header),
            HeaderMatch::Whitespace => {
                let header = normalize_whitespace(header);
                self.headers.iter().any(|h| normalize_whitespace(h) == header)
            }
        }
    }
}

/// Field lookup for a header row
#[derive(Debug, Default)]
pub struct ColumnMap {
    /// Matching column indices per field, in sheet order
    columns: Vec<(ProfileField, Vec<usize>)>,
}

impl ColumnMap {
    pub fn resolve(headers: &StringRecord) -> Self {
        let columns = FIELD_SPECS
            .iter()
            .filter_map(|spec| {
                let indices: Vec<usize> = headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| spec.accepts(h))
                    .map(|(i, _)| i)
                    .collect();
                (!indices.is_empty()).then_some((spec.field, indices))
            })
            .collect();
        Self { columns }
    }

    pub fn has(&self, field: ProfileField) -> bool {
        self.columns.iter().any(|(f, _)| *f == field)
    }

    /// Mapped fields, in [`FIELD_SPECS`] order
    pub fn fields(&self) -> impl Iterator<Item = ProfileField> + '_ {
        self.columns.iter().map(|(f, _)| *f)
    }

    /// First non-blank cell among the field's columns, trimmed
    pub fn value<'r>(&self, record: &'r StringRecord, field: ProfileField) -> Option<&'r str> {
        let (_, indices) = self.columns.iter().find(|(f, _)| *f == field)?;
        indices
            .iter()
            .filter_map(|i| record.get(*i))
            .map(str::trim)
            .find(|v| !v.is_empty())
    }
}

/// Free-text detail slot fed by `field`, if it is a plain text field
pub fn detail_slot(details: &mut ProfileDetails, field: ProfileField) -> Option<&mut Option<String>> {
    use ProfileField::*;
    let slot = match field {
        Email => &mut details.email,
        BirthDate => &mut details.birth_date,
        BirthTime => &mut details.birth_time,
        BirthPlace => &mut details.birth_place,
        Education => &mut details.education,
        Occupation => &mut details.occupation,
        CurrentAddress => &mut details.current_address,
        PermanentAddress => &mut details.permanent_address,
        Photo => &mut details.photo_url,
        Gotra => &mut details.gotra,
        MaritalStatus => &mut details.marital_status,
        Complexion => &mut details.complexion,
        Height => &mut details.height,
        BloodGroup => &mut details.blood_group,
        FatherName => &mut details.father_name,
        FatherOccupation => &mut details.father_occupation,
        MotherName => &mut details.mother_name,
        MotherOccupation => &mut details.mother_occupation,
        ParentMobile => &mut details.parent_mobile,
        PartnerEducation => &mut details.partner_education,
        PartnerLocation => &mut details.partner_location,
        PartnerExpectations => &mut details.partner_expectations,
        AnubandhId | Name | Mobile | Gender | AttendeeSurvey => return None,
    };
    Some(slot)
}
