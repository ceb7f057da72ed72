use std::path::Path;

use anyhow::{Context, Result};

/// Text layer of a PDF.
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    /// Extracted text, pages separated by newlines
    pub text: String,
    /// Number of pages in the PDF
    pub page_count: usize,
}

impl ExtractedPdf {
    /// Non-empty lines, trimmed, in page order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Extract text from a PDF file
pub fn extract_text(path: &Path) -> Result<ExtractedPdf> {
    let pdf_bytes = std::fs::read(path).context("Failed to read PDF file")?;
    extract_text_from_bytes(&pdf_bytes)
}

/// Extract text from PDF bytes already in memory (uploads)
pub fn extract_text_from_bytes(pdf_bytes: &[u8]) -> Result<ExtractedPdf> {
    let doc = lopdf::Document::load_mem(pdf_bytes).context("Failed to parse PDF")?;

    let mut pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    pages.sort();
    let page_count = pages.len();

    let mut text = String::new();
    for page_num in &pages {
        // Scanned pages have no text layer; keep going with the rest.
        let page_text = doc.extract_text(&[*page_num]).unwrap_or_default();
        text.push_str(&page_text);
        if !page_text.ends_with('\n') && !page_text.is_empty() {
            text.push('\n');
        }
    }

    tracing::debug!("Extracted {} chars from {} pages", text.len(), page_count);

    Ok(ExtractedPdf { text, page_count })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry, each showing its text.
    pub(crate) fn create_pdf(page_texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut page_ids = Vec::new();
        for text in page_texts {
            let content = format!(
                "BT /F1 12 Tf 100 700 Td ({}) Tj ET",
                text.replace('\\', "\\\\")
                    .replace('(', "\\(")
                    .replace(')', "\\)")
            );
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            page_ids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }));
        }

        let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_texts.len() as i64),
        });
        for page_id in &page_ids {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Parent", pages_id);
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_extract_text_simple() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pdf_path = temp_dir.path().join("test.pdf");
        std::fs::write(&pdf_path, create_pdf(&["Invoice 2024"])).unwrap();

        let result = extract_text(&pdf_path).unwrap();

        assert_eq!(result.page_count, 1);
        assert!(
            result.text.contains("Invoice") || result.text.contains("2024"),
            "Expected text to contain 'Invoice' or '2024', got: '{}'",
            result.text
        );
        assert!(result.lines().all(|l| !l.is_empty()));
    }

    #[test]
    fn test_extract_text_multipage() {
        let pdf_bytes = create_pdf(&["Page One", "Page Two", "Page Three"]);
        let result = extract_text_from_bytes(&pdf_bytes).unwrap();
        assert_eq!(result.page_count, 3);
        assert!(!result.text.is_empty());
    }

    #[test]
    fn test_extract_text_file_not_found() {
        let err = extract_text(Path::new("/nonexistent/path/to/file.pdf")).unwrap_err();
        assert!(
            err.to_string().contains("Failed to read PDF file"),
            "Expected 'Failed to read PDF file' error, got: {}",
            err
        );
    }

    #[test]
    fn test_extract_text_invalid_pdf() {
        let err = extract_text_from_bytes(b"this is not a valid pdf file").unwrap_err();
        assert!(err.to_string().contains("Failed to parse PDF"));

        let err = extract_text_from_bytes(b"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse PDF"));
    }
}
