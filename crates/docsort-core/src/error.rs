//! Error taxonomy for the renaming engine.
//!
//! Per-document variants are converted into audit `FAILURE` rows by the batch
//! engine and never abort a batch. `Configuration` is raised before any I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while resolving, committing or exporting documents.
#[derive(Debug, Error)]
pub enum RenameError {
    /// A required column, pattern or setting is missing. Fails the whole batch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The record has neither in-memory bytes nor a readable path.
    #[error("source unavailable for '{name}'")]
    SourceUnavailable {
        name: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// No rule produced a name for the document.
    #[error("no name could be resolved for '{name}'")]
    UnresolvedName { name: String },

    /// Writing or moving the renamed file failed.
    #[error("failed to commit '{name}' to {}: {source}", target.display())]
    CommitFailure {
        name: String,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The batch has nothing to export.
    #[error("batch produced no documents to export")]
    EmptyBatch,

    /// The file extension is neither an image nor a PDF.
    #[error("unsupported file type for '{name}'")]
    UnsupportedType { name: String },

    /// Extraction returned no text lines.
    #[error("no text could be extracted from '{name}'")]
    EmptyText { name: String },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write table: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Registry(#[from] crate::jobs::RegistryError),

    /// A worker task died before reporting back.
    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenameError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error only concerns a single document.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::UnresolvedName { .. }
                | Self::CommitFailure { .. }
                | Self::UnsupportedType { .. }
                | Self::EmptyText { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RenameError>;
