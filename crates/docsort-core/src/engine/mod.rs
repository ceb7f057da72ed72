//! Batch engine: classify, extract, resolve, commit, archive.
//!
//! Every document handed to [`BatchEngine::add_document`] produces exactly one
//! audit row at export time. A `SUCCESS` row means the renamed file is in the
//! archive; a `FAILURE` row means it is not. Per-document errors never abort
//! the batch. Only archive I/O fails an export as a whole.

mod archive;
mod audit;

pub use archive::{Archive, ArchiveHandle};
pub use audit::{AuditLog, AuditRow, AuditStatus};

pub(crate) use archive::ArchiveBuilder;

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RenameError, Result};
use crate::extract::TextExtractor;
use crate::files::{DocumentKind, FileRecord, KeyedFilePair};
use crate::resolve::{NameResolver, Resolution};
use crate::table::TextTable;

/// What to do with a document whose name could not be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
    /// Leave it out of the archive.
    #[default]
    Skip,
    /// Archive it under its original name.
    KeepOriginal,
}

impl FromStr for UnresolvedPolicy {
    type Err = RenameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "skip" => Ok(Self::Skip),
            "keep-original" | "keep" => Ok(Self::KeepOriginal),
            other => Err(RenameError::configuration(format!(
                "unknown unresolved policy '{}' (expected skip or keep-original)",
                other
            ))),
        }
    }
}

enum Entry {
    Pair(KeyedFilePair),
    Rejected { origin: FileRecord, reason: RenameError },
}

/// Drives one batch end to end.
pub struct BatchEngine {
    resolver: Arc<dyn NameResolver>,
    extractor: Arc<dyn TextExtractor>,
    policy: UnresolvedPolicy,
    entries: Vec<Entry>,
    log: AuditLog,
    text: TextTable,
}

impl BatchEngine {
    pub fn new(resolver: Arc<dyn NameResolver>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            resolver,
            extractor,
            policy: UnresolvedPolicy::default(),
            entries: Vec::new(),
            log: AuditLog::new(),
            text: TextTable::new(),
        }
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn extractor(&self) -> Arc<dyn TextExtractor> {
        self.extractor.clone()
    }

    /// Documents added and not yet exported.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Classify, extract and resolve one document.
    pub fn add_document(&mut self, record: FileRecord) {
        if record.kind() == DocumentKind::Unsupported {
            let name = record.display_name();
            self.reject(record, RenameError::UnsupportedType { name });
            return;
        }
        let table = self.extractor.extract(&record);
        self.add_extracted(record, table);
    }

    /// Resolve a document whose text was extracted elsewhere (e.g. on a
    /// blocking thread).
    pub fn add_extracted(&mut self, record: FileRecord, table: TextTable) {
        let name = record.display_name();
        if record.kind() == DocumentKind::Unsupported {
            self.reject(record, RenameError::UnsupportedType { name });
            return;
        }
        if table.is_empty() {
            self.reject(record, RenameError::EmptyText { name });
            return;
        }

        let resolution = match self.resolver.resolve(&table) {
            Resolution::Unresolved if self.policy == UnresolvedPolicy::KeepOriginal => {
                tracing::info!(file = %name, "No name resolved, keeping original name");
                Resolution::from_name(record.name().map(str::to_string))
            }
            resolution => resolution,
        };
        self.text.append(table);

        if !resolution.is_resolved() {
            self.reject(record, RenameError::UnresolvedName { name });
            return;
        }

        tracing::debug!(file = %name, new_name = ?resolution.name(), "Resolved document name");
        let output = resolution.into_output(record.extension());
        self.entries.push(Entry::Pair(KeyedFilePair::new(record, output)));
    }

    fn reject(&mut self, origin: FileRecord, reason: RenameError) {
        debug_assert!(reason.is_per_document());
        tracing::warn!(file = %origin.display_name(), "Skipping document: {}", reason);
        self.entries.push(Entry::Rejected { origin, reason });
    }

    /// Commit every pending document into `target_dir` and pack the
    /// committed files into a zip at `archive_path`.
    ///
    /// Returns `None` when no document got as far as a commit (empty batch,
    /// or every document rejected); the log still records the rejections.
    pub fn export_to_archive(
        &mut self,
        target_dir: &Path,
        archive_path: &Path,
    ) -> Result<Option<Archive>> {
        if !self.entries.iter().any(|e| matches!(e, Entry::Pair(_))) {
            for entry in std::mem::take(&mut self.entries) {
                if let Entry::Rejected { origin, reason } = entry {
                    self.log.push(AuditRow::failure(origin.display_name(), reason));
                }
            }
            tracing::warn!(failed = self.log.failures(), "{}", RenameError::EmptyBatch);
            return Ok(None);
        }

        // Nothing is committed until the archive can be created.
        let mut builder = ArchiveBuilder::create(archive_path)?;
        for entry in std::mem::take(&mut self.entries) {
            let row = match entry {
                Entry::Rejected { origin, reason } => {
                    AuditRow::failure(origin.display_name(), reason)
                }
                Entry::Pair(pair) => commit_into(&mut builder, pair, target_dir),
            };
            self.log.push(row);
        }

        let archive = builder.finish()?;
        tracing::info!(
            archived = archive.len(),
            failed = self.log.failures(),
            archive = %archive.path().display(),
            "Batch exported"
        );
        Ok(Some(archive))
    }

    /// Audit rows for every exported document, in the order they were added.
    pub fn export_log(&self) -> &AuditLog {
        &self.log
    }

    /// Every line extracted so far, across documents.
    pub fn extracted_text(&self) -> &TextTable {
        &self.text
    }
}

/// Commit one pair and add the committed file to the archive.
///
/// A file that was committed but could not be packed is a failure row; its
/// detail names where the committed file is.
fn commit_into(
    builder: &mut ArchiveBuilder,
    pair: KeyedFilePair,
    target_dir: &Path,
) -> AuditRow {
    let outcome = pair.commit(target_dir);
    let origin_name = outcome.origin.display_name();
    let committed = outcome
        .output
        .as_ref()
        .and_then(|o| Some((o.file_name()?, o.path()?)));

    match (committed, outcome.error) {
        (Some((file_name, path)), _) => match builder.add_file(&file_name, path) {
            Ok(()) => AuditRow::success(origin_name, file_name),
            Err(e) => {
                tracing::warn!(file = %origin_name, "Failed to archive committed file: {}", e);
                AuditRow::failure(
                    origin_name,
                    format!("committed to {} but not archived: {}", path.display(), e),
                )
            }
        },
        (None, Some(error)) => AuditRow::failure(origin_name, error),
        (None, None) => AuditRow::failure(origin_name, "commit produced no file"),
    }
}
