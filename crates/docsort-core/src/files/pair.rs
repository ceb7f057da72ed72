//! Origin/output pairs and collision-safe placement of renamed files.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::record::FileRecord;
use crate::error::{RenameError, Result};

/// Result of committing one pair. Commit never fails with an error value;
/// failures are reported here so the caller can log and continue.
#[derive(Debug)]
pub struct CommitOutcome {
    pub origin: FileRecord,
    /// Output record pointing at the final location, on success.
    pub output: Option<FileRecord>,
    pub success: bool,
    pub error: Option<RenameError>,
}

/// An origin file and the output it should become.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedFilePair {
    origin: FileRecord,
    output: FileRecord,
}

impl KeyedFilePair {
    pub fn new(origin: FileRecord, output: FileRecord) -> Self {
        Self { origin, output }
    }

    pub fn origin(&self) -> &FileRecord {
        &self.origin
    }

    pub fn output(&self) -> &FileRecord {
        &self.output
    }

    /// Place the output under `target_dir`.
    ///
    /// Uploaded content (bytes in memory) is written as a copy and the origin
    /// is never touched. Disk-only origins are moved. An existing file at the
    /// target is never overwritten: `name-1.ext`, `name-2.ext`, ... are tried
    /// until a free path is found.
    pub fn commit(self, target_dir: &Path) -> CommitOutcome {
        match self.try_commit(target_dir) {
            Ok(output) => {
                tracing::debug!(
                    origin = %self.origin.display_name(),
                    target = %output.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    "Committed renamed file"
                );
                CommitOutcome {
                    origin: self.origin,
                    output: Some(output),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(origin = %self.origin.display_name(), "Commit failed: {}", e);
                CommitOutcome {
                    origin: self.origin,
                    output: None,
                    success: false,
                    error: Some(e),
                }
            }
        }
    }

    fn try_commit(&self, target_dir: &Path) -> Result<FileRecord> {
        let Some(name) = self.output.name() else {
            return Err(RenameError::UnresolvedName {
                name: self.origin.display_name(),
            });
        };
        let extension = self.output.extension().or(self.origin.extension());

        // Output bytes win over origin bytes; only a path-only origin is moved.
        let payload = match (self.output.bytes().or(self.origin.bytes()), self.origin.path()) {
            (Some(bytes), _) => Payload::Write(bytes.as_ref()),
            (None, Some(path)) => Payload::Move(path),
            (None, None) => {
                return Err(RenameError::SourceUnavailable {
                    name: self.origin.display_name(),
                    source: None,
                })
            }
        };

        std::fs::create_dir_all(target_dir).map_err(|e| self.commit_error(target_dir, e))?;

        let (stem, target) = match payload {
            Payload::Write(bytes) => write_new(target_dir, name, extension, bytes)
                .map_err(|e| self.commit_error(target_dir, e))?,
            Payload::Move(source) => move_new(source, target_dir, name, extension)
                .map_err(|e| self.commit_error(target_dir, e))?,
        };

        let mut output = FileRecord::output(stem, extension);
        output.set_path(Some(target));
        Ok(output)
    }

    fn commit_error(&self, target: &Path, source: std::io::Error) -> RenameError {
        RenameError::CommitFailure {
            name: self.origin.display_name(),
            target: target.to_path_buf(),
            source,
        }
    }
}

enum Payload<'a> {
    Write(&'a [u8]),
    Move(&'a Path),
}

fn candidate(
    dir: &Path,
    name: &str,
    extension: Option<&str>,
    counter: usize,
) -> (String, PathBuf) {
    let stem = if counter == 0 {
        name.to_string()
    } else {
        format!("{}-{}", name, counter)
    };
    let path = dir.join(format!("{}{}", stem, extension.unwrap_or("")));
    (stem, path)
}

/// Write `bytes` to the first free candidate, creating it exclusively so a
/// concurrent writer can never be clobbered.
fn write_new(
    dir: &Path,
    name: &str,
    extension: Option<&str>,
    bytes: &[u8],
) -> std::io::Result<(String, PathBuf)> {
    let mut counter = 0;
    loop {
        let (stem, path) = candidate(dir, name, extension, counter);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                file.flush()?;
                return Ok((stem, path));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Move `source` to the first free candidate without ever replacing an
/// existing file.
///
/// The new name is claimed with a hard link, which fails if the target
/// exists, and the origin is unlinked afterwards. Where links are not
/// possible (another filesystem, no link support) the content is copied into
/// an exclusively created file instead.
fn move_new(
    source: &Path,
    dir: &Path,
    name: &str,
    extension: Option<&str>,
) -> std::io::Result<(String, PathBuf)> {
    if !source.is_file() {
        return Err(std::io::Error::new(
            ErrorKind::NotFound,
            format!("origin {} does not exist", source.display()),
        ));
    }

    let mut counter = 0;
    loop {
        let (stem, path) = candidate(dir, name, extension, counter);
        let claimed = match std::fs::hard_link(source, &path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
            Err(e) => {
                tracing::debug!(target = %path.display(), "Hard link failed, copying: {}", e);
                copy_new(source, &path)?
            }
        };
        if claimed {
            if let Err(e) = std::fs::remove_file(source) {
                // The origin stays put; drop the second name.
                discard(&path);
                return Err(e);
            }
            return Ok((stem, path));
        }
        counter += 1;
    }
}

/// Copy `source` into a newly created `target`. Returns `false` if `target`
/// already exists.
fn copy_new(source: &Path, target: &Path) -> std::io::Result<bool> {
    let mut reader = File::open(source)?;
    let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };
    let copied = std::io::copy(&mut reader, &mut file).and_then(|_| file.flush());
    if let Err(e) = copied {
        drop(file);
        discard(target);
        return Err(e);
    }
    Ok(true)
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "Failed to remove partial file: {}", e);
    }
}
