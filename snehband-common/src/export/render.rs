//! PDF rendering of a computed layout

use std::io::Cursor;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use tracing::warn;

use super::layout::{DocumentLayout, Script, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::config::PdfConfig;
use crate::{Error, Result};

/// Font files embedded into exported documents
#[derive(Debug, Clone, Default)]
pub struct FontSources {
    /// Latin TTF; built-in Helvetica when absent
    pub latin: Option<Vec<u8>>,
    /// Devanagari TTF; Devanagari text falls back to the Latin font when absent
    pub devanagari: Option<Vec<u8>>,
}

fn read_font(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read font {}: {}", path.display(), e)))
}

impl FontSources {
    pub fn load(config: &PdfConfig) -> Result<Self> {
        let latin = config.latin_font.as_deref().map(read_font).transpose()?;
        let devanagari = config.devanagari_font.as_deref().map(read_font).transpose()?;
        if devanagari.is_none() {
            warn!("No Devanagari font configured; Marathi text in PDF exports will not render");
        }
        Ok(Self { latin, devanagari })
    }
}

fn pdf_error(e: printpdf::Error) -> Error {
    Error::Internal(format!("PDF rendering failed: {}", e))
}

struct Fonts {
    latin: IndirectFontRef,
    devanagari: Option<IndirectFontRef>,
}

impl Fonts {
    fn embed(doc: &PdfDocumentReference, sources: &FontSources) -> Result<Self> {
        let latin = match &sources.latin {
            Some(bytes) => doc.add_external_font(Cursor::new(bytes.as_slice())),
            None => doc.add_builtin_font(BuiltinFont::Helvetica),
        }
        .map_err(pdf_error)?;

        let devanagari = sources
            .devanagari
            .as_ref()
            .map(|bytes| doc.add_external_font(Cursor::new(bytes.as_slice())))
            .transpose()
            .map_err(pdf_error)?;

        Ok(Self { latin, devanagari })
    }

    fn for_script(&self, script: Script) -> &IndirectFontRef {
        match script {
            Script::Devanagari => self.devanagari.as_ref().unwrap_or(&self.latin),
            Script::Latin => &self.latin,
        }
    }
}

/// Render every page of `layout` into PDF bytes
pub fn render_pdf(layout: &DocumentLayout, sources: &FontSources) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        layout.title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Page 1",
    );
    let fonts = Fonts::embed(&doc, sources)?;

    for (i, page) in layout.pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), format!("Page {}", i + 1))
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        for run in &page.runs {
            layer.use_text(
                run.text.as_str(),
                run.size,
                Mm(run.x_mm),
                Mm(run.y_mm),
                fonts.for_script(run.script),
            );
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}
