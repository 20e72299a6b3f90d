//! PDF export of profile lists
//!
//! [`layout`] places text by item count and script; [`render`] turns the
//! placement into a PDF with embedded fonts.

pub mod layout;
pub mod render;

pub use layout::{detect_script, layout_document, wrap, ExportLayout, Script};
pub use render::{render_pdf, FontSources};

use crate::db::models::Profile;
use crate::Result;

/// Document title used for exports
pub fn export_title(layout: ExportLayout) -> &'static str {
    match layout {
        ExportLayout::Roster => "Snehband Pandharpur 2025 - Roster",
        ExportLayout::Cards => "Snehband Pandharpur 2025 - Profiles",
    }
}

/// Lay out and render `profiles`
pub fn export_pdf(layout: ExportLayout, profiles: &[Profile], fonts: &FontSources) -> Result<Vec<u8>> {
    let document = layout_document(layout, export_title(layout), profiles);
    render_pdf(&document, fonts)
}
