//! Text extraction boundary.
//!
//! Extraction is best effort: a document that cannot be read or parsed
//! yields an empty [`TextTable`] and the engine records it as a failure.
//! PDFs with a text layer are read with lopdf. Images (and PDFs without a
//! text layer) need an OCR backend, which is plugged in from outside.

pub mod pdf;
mod spreadsheet;

pub use spreadsheet::read_spreadsheet;

use std::sync::Arc;

use crate::files::{DocumentKind, FileRecord};
use crate::table::TextTable;

/// Turns one document into rows of text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, record: &FileRecord) -> TextTable;
}

/// Dispatches on document kind: lopdf for PDFs, the OCR backend for images.
#[derive(Clone, Default)]
pub struct DocumentExtractor {
    ocr: Option<Arc<dyn TextExtractor>>,
}

impl DocumentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `ocr` for images and for PDFs without a text layer.
    pub fn with_ocr(ocr: Arc<dyn TextExtractor>) -> Self {
        Self { ocr: Some(ocr) }
    }

    fn extract_pdf(&self, record: &FileRecord) -> TextTable {
        let name = record.display_name();
        let lines = match (record.bytes(), record.path()) {
            (Some(bytes), _) => pdf::extract_text_from_bytes(bytes),
            (None, Some(path)) => pdf::extract_text(path),
            (None, None) => record
                .bytes_or_read()
                .map_err(anyhow::Error::from)
                .and_then(|bytes| pdf::extract_text_from_bytes(&bytes)),
        };

        match lines {
            Ok(pdf) => {
                let table = TextTable::from_lines(Some(&name), pdf.lines());
                if table.is_empty() {
                    tracing::debug!(file = %name, pages = pdf.page_count, "PDF has no text layer");
                    return self.ocr(record);
                }
                table
            }
            Err(e) => {
                tracing::warn!(file = %name, "PDF extraction failed: {:#}", e);
                TextTable::new()
            }
        }
    }

    fn ocr(&self, record: &FileRecord) -> TextTable {
        match &self.ocr {
            Some(ocr) => ocr.extract(record),
            None => {
                tracing::debug!(file = %record.display_name(), "No OCR backend configured");
                TextTable::new()
            }
        }
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, record: &FileRecord) -> TextTable {
        let mut table = match record.kind() {
            DocumentKind::Pdf => self.extract_pdf(record),
            DocumentKind::Image => self.ocr(record),
            DocumentKind::Unsupported => TextTable::new(),
        };
        table.fill_file_type(record.extension());
        table
    }
}
