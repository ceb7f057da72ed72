//! Docsort Core - batch renaming of scanned documents
//!
//! This crate contains the renaming engine and its job layer:
//! - File records and collision-safe placement (`files`)
//! - Name resolution from extracted text (`resolve`)
//! - Text extraction boundary, PDF text layer (lopdf), CSV spreadsheets (`extract`)
//! - Batch export to a zip archive plus audit log (`engine`)
//! - In-memory job registry and workers for asynchronous batches (`jobs`)

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod files;
pub mod jobs;
pub mod resolve;
pub mod table;

pub use config::Config;
pub use engine::{
    Archive, ArchiveHandle, AuditLog, AuditRow, AuditStatus, BatchEngine, UnresolvedPolicy,
};
pub use error::{RenameError, Result};
pub use extract::{read_spreadsheet, DocumentExtractor, TextExtractor};
pub use files::{CommitOutcome, DocumentKind, FileRecord, KeyedFilePair};
pub use jobs::{
    BatchRequest, InlineWorker, JobCoordinator, JobProgress, JobRegistry, JobState, TakeError,
    TokioWorker, Worker,
};
pub use resolve::{
    DocumentType, NameResolver, NamingStrategy, PatternResolver, Resolution, SpreadsheetFilter,
    SpreadsheetResolver,
};
pub use table::{Table, TextRow, TextTable};
