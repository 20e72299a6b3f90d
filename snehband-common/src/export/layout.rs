//! Page layout for exported profile lists
//!
//! Layout is computed in character columns and millimetres without touching
//! any PDF machinery, so it can be inspected directly. Pages are filled by
//! item count; text that exceeds its slot is wrapped and then cut.

use crate::db::models::Profile;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 14.0;

const TITLE_SIZE: f32 = 15.0;
const HEADER_SIZE: f32 = 9.5;
const BODY_SIZE: f32 = 8.5;
const FOOTER_SIZE: f32 = 7.5;
const LINE_MM: f32 = 4.2;

pub const ROSTER_ROWS_PER_PAGE: usize = 24;
const ROSTER_ROW_MM: f32 = 9.5;
const ROSTER_LINES_PER_ROW: usize = 2;

pub const CARDS_PER_PAGE: usize = 3;
const CARD_HEIGHT_MM: f32 = 86.0;
const CARD_MAX_LINES: usize = 18;
const CARD_LABEL_MM: f32 = 42.0;
const CARD_VALUE_CHARS: usize = 64;

/// Writing system of a string, deciding which font renders it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Latin,
    Devanagari,
}

fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}' | '\u{A8E0}'..='\u{A8FF}')
}

/// Devanagari when any code point falls in the Devanagari blocks
pub fn detect_script(text: &str) -> Script {
    if text.chars().any(is_devanagari) {
        Script::Devanagari
    } else {
        Script::Latin
    }
}

/// Wrap `text` to lines of at most `width` characters
///
/// Latin text breaks between whitespace-separated tokens and hard-splits
/// tokens longer than a line. Devanagari text breaks at any character.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    match detect_script(text) {
        Script::Latin => wrap_tokens(text, width),
        Script::Devanagari => wrap_chars(text, width),
    }
}

fn wrap_tokens(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for token in text.split_whitespace() {
        let token_len = token.chars().count();
        if current_len > 0 && current_len + 1 + token_len <= width {
            current.push(' ');
            current.push_str(token);
            current_len += 1 + token_len;
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        let chars: Vec<char> = token.chars().collect();
        let mut chunks = chars.chunks(width).peekable();
        while let Some(chunk) = chunks.next() {
            if chunks.peek().is_some() {
                lines.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let flat: Vec<char> = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();
    flat.chunks(width)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Keep at most `max` lines, marking the cut on the last kept line
fn clamp_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}

/// Export layout selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLayout {
    /// One table row per profile
    #[default]
    Roster,
    /// Detail sheet per profile
    Cards,
}

/// One positioned string; `y_mm` is measured from the page bottom
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub script: Script,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub runs: Vec<TextRun>,
}

impl PageLayout {
    fn text(&mut self, text: impl Into<String>, x_mm: f32, y_mm: f32, size: f32) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.runs.push(TextRun {
            script: detect_script(&text),
            text,
            x_mm,
            y_mm,
            size,
        });
    }

    /// Every string on the page, in placement order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub title: String,
    pub pages: Vec<PageLayout>,
}

fn gender_label(profile: &Profile) -> &'static str {
    profile.gender.map(|g| g.as_str()).unwrap_or("-")
}

fn status_label(profile: &Profile) -> String {
    let mut label = if profile.approved { "Approved" } else { "Pending" }.to_string();
    if profile.introduction {
        label.push_str(" +Intro");
    }
    if profile.checked_in_at.is_some() {
        label.push_str(" +In");
    }
    label
}

fn page_heading(page: &mut PageLayout, title: &str, subtitle: &str) -> f32 {
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
    page.text(title, MARGIN_MM, y, TITLE_SIZE);
    y -= LINE_MM * 1.6;
    page.text(subtitle, MARGIN_MM, y, BODY_SIZE);
    y - LINE_MM * 2.0
}

fn add_footers(pages: &mut [PageLayout]) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        page.text(
            format!("Page {} / {}", i + 1, total),
            PAGE_WIDTH_MM - MARGIN_MM - 22.0,
            MARGIN_MM / 2.0,
            FOOTER_SIZE,
        );
    }
}

struct RosterColumn {
    heading: &'static str,
    x_mm: f32,
    chars: usize,
}

const ROSTER_COLUMNS: [RosterColumn; 6] = [
    RosterColumn { heading: "ID", x_mm: MARGIN_MM, chars: 8 },
    RosterColumn { heading: "Name", x_mm: MARGIN_MM + 17.0, chars: 34 },
    RosterColumn { heading: "Mobile", x_mm: MARGIN_MM + 80.0, chars: 14 },
    RosterColumn { heading: "Gender", x_mm: MARGIN_MM + 106.0, chars: 8 },
    RosterColumn { heading: "Attendees", x_mm: MARGIN_MM + 124.0, chars: 6 },
    RosterColumn { heading: "Status", x_mm: MARGIN_MM + 144.0, chars: 22 },
];

fn roster_cells(profile: &Profile) -> [String; 6] {
    [
        profile.anubandh_id.to_string(),
        profile.name.clone(),
        profile.mobile.clone(),
        gender_label(profile).to_string(),
        profile.attendee_count.to_string(),
        status_label(profile),
    ]
}

/// Table of profiles, header repeated on every page
pub fn layout_roster(title: &str, profiles: &[Profile]) -> DocumentLayout {
    let subtitle = format!("{} profiles", profiles.len());
    let mut pages = Vec::new();

    let mut chunks: Vec<&[Profile]> = profiles.chunks(ROSTER_ROWS_PER_PAGE).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    for chunk in chunks {
        let mut page = PageLayout::default();
        let mut y = page_heading(&mut page, title, &subtitle);
        for column in &ROSTER_COLUMNS {
            page.text(column.heading, column.x_mm, y, HEADER_SIZE);
        }
        y -= ROSTER_ROW_MM;

        for profile in chunk {
            for (column, cell) in ROSTER_COLUMNS.iter().zip(roster_cells(profile)) {
                let lines = clamp_lines(wrap(&cell, column.chars), ROSTER_LINES_PER_ROW);
                for (n, line) in lines.into_iter().enumerate() {
                    page.text(line, column.x_mm, y - n as f32 * LINE_MM, BODY_SIZE);
                }
            }
            y -= ROSTER_ROW_MM;
        }
        pages.push(page);
    }

    add_footers(&mut pages);
    DocumentLayout {
        title: title.to_string(),
        pages,
    }
}

fn card_fields(profile: &Profile) -> Vec<(&'static str, String)> {
    let d = &profile.details;
    let fields = vec![
        ("नाव / Name", Some(profile.name.clone())),
        ("मोबाईल / Mobile", Some(profile.mobile.clone())),
        ("लिंग / Gender", Some(gender_label(profile).to_string())),
        ("उपस्थित / Attendees", Some(profile.attendee_count.to_string())),
        ("Status", Some(status_label(profile))),
        ("ई-मेल / Email", d.email.clone()),
        ("जन्म तारीख / Birth date", d.birth_date.clone()),
        ("जन्म वेळ / Birth time", d.birth_time.clone()),
        ("जन्म स्थळ / Birth place", d.birth_place.clone()),
        ("शिक्षण / Education", d.education.clone()),
        ("व्यवसाय / Occupation", d.occupation.clone()),
        ("उंची / Height", d.height.clone()),
        ("गोत्र / Gotra", d.gotra.clone()),
        ("वडिलांचे नाव / Father", d.father_name.clone()),
        ("पालक मोबाईल / Parent mobile", d.parent_mobile.clone()),
        ("पत्ता / Address", d.current_address.clone()),
        ("अपेक्षा / Expectations", d.partner_expectations.clone()),
    ];
    fields
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
}

/// Detail sheet, a fixed number of profiles per page
pub fn layout_cards(title: &str, profiles: &[Profile]) -> DocumentLayout {
    let subtitle = format!("{} profiles", profiles.len());
    let mut pages = Vec::new();

    let mut chunks: Vec<&[Profile]> = profiles.chunks(CARDS_PER_PAGE).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    for chunk in chunks {
        let mut page = PageLayout::default();
        let top = page_heading(&mut page, title, &subtitle);

        for (slot, profile) in chunk.iter().enumerate() {
            let mut y = top - slot as f32 * CARD_HEIGHT_MM;
            page.text(
                format!("#{}", profile.anubandh_id),
                MARGIN_MM,
                y,
                HEADER_SIZE,
            );
            y -= LINE_MM * 1.3;

            let mut used = 0;
            for (label, value) in card_fields(profile) {
                let lines = wrap(&value, CARD_VALUE_CHARS);
                if used + lines.len().max(1) > CARD_MAX_LINES {
                    break;
                }
                page.text(label, MARGIN_MM, y, BODY_SIZE);
                if lines.is_empty() {
                    y -= LINE_MM;
                    used += 1;
                }
                for line in lines {
                    page.text(line, MARGIN_MM + CARD_LABEL_MM, y, BODY_SIZE);
                    y -= LINE_MM;
                    used += 1;
                }
            }
        }
        pages.push(page);
    }

    add_footers(&mut pages);
    DocumentLayout {
        title: title.to_string(),
        pages,
    }
}

pub fn layout_document(layout: ExportLayout, title: &str, profiles: &[Profile]) -> DocumentLayout {
    match layout {
        ExportLayout::Roster => layout_roster(title, profiles),
        ExportLayout::Cards => layout_cards(title, profiles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Gender, ProfileDetails};
    use chrono::Utc;

    fn profile(id: i64, name: &str) -> Profile {
        Profile {
            anubandh_id: id,
            id_synthetic: false,
            name: name.to_string(),
            mobile: "9876543210".to_string(),
            gender: Some(Gender::Female),
            attendee_count: 2,
            approved: id % 2 == 0,
            introduction: false,
            checked_in_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            details: ProfileDetails::default(),
        }
    }

    #[test]
    fn test_detect_script() {
        assert_eq!(detect_script("Sneha Patil"), Script::Latin);
        assert_eq!(detect_script("स्नेहा"), Script::Devanagari);
        assert_eq!(detect_script("Sneha स्नेहा"), Script::Devanagari);
        assert_eq!(detect_script("\u{A8F2}"), Script::Devanagari);
        assert_eq!(detect_script(""), Script::Latin);
    }

    #[test]
    fn test_wrap_latin_on_tokens() {
        assert_eq!(
            wrap("software engineer at a large firm", 12),
            vec!["software", "engineer at", "a large firm"]
        );
    }

    #[test]
    fn test_wrap_latin_hard_splits_long_tokens() {
        assert_eq!(wrap("abcdefghij xy", 4), vec!["abcd", "efgh", "ij", "xy"]);
        assert_eq!(wrap("abcdefgh", 4), vec!["abcd", "efgh"]);
    }

    #[test]
    fn test_wrap_devanagari_per_character() {
        let lines = wrap("पुणे शहर", 3);
        assert!(lines.iter().all(|l| l.chars().count() <= 3));
        assert_eq!(lines.concat().replace(' ', ""), "पुणेशहर");
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_roster_paginates_by_count() {
        let profiles: Vec<Profile> = (1..=(ROSTER_ROWS_PER_PAGE as i64 * 2 + 1))
            .map(|i| profile(i, "Asha"))
            .collect();
        let doc = layout_roster("Roster", &profiles);
        assert_eq!(doc.pages.len(), 3);
        for page in &doc.pages {
            assert_eq!(page.texts().filter(|t| *t == "Mobile").count(), 1);
        }
        assert!(doc.pages[2].texts().any(|t| t == "49"));
        assert!(doc.pages[2].texts().any(|t| t == "Page 3 / 3"));
    }

    #[test]
    fn test_roster_cuts_long_names() {
        let long = "word ".repeat(40);
        let doc = layout_roster("Roster", &[profile(2, &long)]);
        let name_lines: Vec<&str> = doc.pages[0].texts().filter(|t| t.starts_with("word")).collect();
        assert_eq!(name_lines.len(), ROSTER_LINES_PER_ROW);
        assert!(name_lines[1].ends_with("..."));
    }

    #[test]
    fn test_cards_paginate_and_mark_scripts() {
        let profiles = vec![profile(1, "स्नेहा पाटील"), profile(2, "Sneha"), profile(3, "A"), profile(4, "B")];
        let doc = layout_cards("Cards", &profiles);
        assert_eq!(doc.pages.len(), 2);
        let run = doc.pages[0]
            .runs
            .iter()
            .find(|r| r.text == "स्नेहा पाटील")
            .unwrap();
        assert_eq!(run.script, Script::Devanagari);
        assert!(doc.pages[1].texts().any(|t| t == "#4"));
    }

    #[test]
    fn test_empty_export_has_title_page() {
        for layout in [ExportLayout::Roster, ExportLayout::Cards] {
            let doc = layout_document(layout, "Empty", &[]);
            assert_eq!(doc.pages.len(), 1);
            assert!(doc.pages[0].texts().any(|t| t == "Empty"));
        }
    }

    #[test]
    fn test_runs_stay_on_page() {
        let profiles: Vec<Profile> = (1..=30).map(|i| profile(i, "Asha Kulkarni")).collect();
        for layout in [ExportLayout::Roster, ExportLayout::Cards] {
            let doc = layout_document(layout, "T", &profiles);
            for run in doc.pages.iter().flat_map(|p| &p.runs) {
                assert!(run.y_mm > 0.0 && run.y_mm < PAGE_HEIGHT_MM, "{:?}", run);
                assert!(run.x_mm >= 0.0 && run.x_mm < PAGE_WIDTH_MM);
            }
        }
    }
}
