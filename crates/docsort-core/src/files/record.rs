//! File records: a file that may live on disk, only in memory, or both.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use super::name::{is_null_sentinel, normalize_extension, split_file_name};
use crate::error::{RenameError, Result};

/// How a document is handed to text extraction, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Image,
    Pdf,
    Unsupported,
}

impl DocumentKind {
    /// Classify an extension (with or without the leading dot).
    pub fn from_extension(extension: Option<&str>) -> Self {
        let Some(extension) = extension else {
            return Self::Unsupported;
        };
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if extension == "pdf" {
            Self::Pdf
        } else if image::ImageFormat::from_extension(&extension).is_some() {
            Self::Image
        } else {
            Self::Unsupported
        }
    }
}

/// Identity and payload of one file.
///
/// At least one of `bytes` or `path` must be set before the record is
/// committed. Extensions are stored normalized (leading `.`, never `nan`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    name: Option<String>,
    extension: Option<String>,
    bytes: Option<Bytes>,
    path: Option<PathBuf>,
}

impl FileRecord {
    /// Record for uploaded content. `file_name` includes the extension.
    pub fn from_bytes(file_name: &str, bytes: impl Into<Bytes>) -> Self {
        let (name, extension) = split_file_name(file_name);
        Self {
            name: non_null(name),
            extension,
            bytes: Some(bytes.into()),
            path: None,
        }
    }

    /// Record for a file on disk. The content is read lazily.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (name, extension) = path
            .file_name()
            .map(|n| split_file_name(&n.to_string_lossy()))
            .unwrap_or_default();
        Self {
            name: non_null(name),
            extension,
            bytes: None,
            path: Some(path),
        }
    }

    /// Output record with a resolved name and the origin's extension.
    pub fn output(name: impl Into<String>, extension: Option<&str>) -> Self {
        let mut record = Self::default();
        record.set_name(Some(name.into()));
        record.set_extension(extension);
        record
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name.and_then(non_null);
    }

    pub fn set_extension(&mut self, extension: Option<&str>) {
        self.extension = extension.and_then(normalize_extension);
    }

    pub fn set_bytes(&mut self, bytes: Option<Bytes>) {
        self.bytes = bytes;
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    /// Name with extension, if a name is known.
    pub fn file_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(format!("{}{}", name, self.extension.as_deref().unwrap_or("")))
    }

    /// Whether the record has content to commit.
    pub fn has_source(&self) -> bool {
        self.bytes.is_some() || self.path.is_some()
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_extension(self.extension.as_deref())
    }

    /// In-memory bytes if present, otherwise the full content of `path`.
    pub fn bytes_or_read(&self) -> Result<Bytes> {
        if let Some(bytes) = &self.bytes {
            return Ok(bytes.clone());
        }
        let Some(path) = &self.path else {
            return Err(RenameError::SourceUnavailable {
                name: self.display_name(),
                source: None,
            });
        };
        std::fs::read(path)
            .map(Bytes::from)
            .map_err(|e| RenameError::SourceUnavailable {
                name: self.display_name(),
                source: Some(e),
            })
    }

    /// Content digest of the in-memory bytes.
    pub fn digest(&self) -> Option<String> {
        self.bytes
            .as_ref()
            .map(|b| blake3::hash(b).to_hex().to_string())
    }

    /// Human readable identity for logs: the file name, the on-disk name, or a
    /// digest-derived name for anonymous uploads.
    pub fn display_name(&self) -> String {
        if let Some(file_name) = self.file_name() {
            return file_name;
        }
        if let Some(name) = self.path.as_ref().and_then(|p| p.file_name()) {
            return name.to_string_lossy().to_string();
        }
        match self.digest() {
            Some(digest) => format!(
                "{}{}",
                &digest[..16],
                self.extension.as_deref().unwrap_or("")
            ),
            None => "<unnamed>".to_string(),
        }
    }
}

fn non_null(value: String) -> Option<String> {
    if is_null_sentinel(&value) {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_splits_name() {
        let record = FileRecord::from_bytes("scan 01.PDF", b"data".to_vec());
        assert_eq!(record.name(), Some("scan 01"));
        assert_eq!(record.extension(), Some(".PDF"));
        assert_eq!(record.kind(), DocumentKind::Pdf);
        assert_eq!(record.file_name().as_deref(), Some("scan 01.PDF"));
    }

    #[test]
    fn test_nan_values_are_absent() {
        let mut record = FileRecord::from_bytes("nan", b"x".to_vec());
        assert_eq!(record.name(), None);
        assert_eq!(record.extension(), None);

        record.set_extension(Some("nan"));
        assert_eq!(record.extension(), None);
        record.set_extension(Some("jpg"));
        assert_eq!(record.extension(), Some(".jpg"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(DocumentKind::from_extension(Some(".jpeg")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_extension(Some("PNG")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_extension(Some(".tif")), DocumentKind::Image);
        assert_eq!(DocumentKind::from_extension(Some(".pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_extension(Some(".docx")), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_extension(None), DocumentKind::Unsupported);
    }

    #[test]
    fn test_bytes_or_read_prefers_memory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a.pdf");
        std::fs::write(&path, b"on disk").unwrap();

        let mut record = FileRecord::from_path(&path);
        assert_eq!(record.bytes_or_read().unwrap().as_ref(), b"on disk");

        record.set_bytes(Some(Bytes::from_static(b"in memory")));
        assert_eq!(record.bytes_or_read().unwrap().as_ref(), b"in memory");
    }

    #[test]
    fn test_bytes_or_read_without_source() {
        let record = FileRecord::output("report", Some(".pdf"));
        assert!(!record.has_source());
        assert!(matches!(
            record.bytes_or_read(),
            Err(RenameError::SourceUnavailable { source: None, .. })
        ));

        let missing = FileRecord::from_path("/nonexistent/dir/file.pdf");
        assert!(matches!(
            missing.bytes_or_read(),
            Err(RenameError::SourceUnavailable { source: Some(_), .. })
        ));
    }

    #[test]
    fn test_display_name_falls_back_to_digest() {
        let mut record = FileRecord::from_bytes("nan", b"payload".to_vec());
        record.set_extension(Some(".png"));
        let display = record.display_name();
        assert!(display.ends_with(".png"));
        assert_eq!(display.len(), 16 + 4);
    }
}
