//! Zip archive of committed files.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// An archive written to disk, with the names of its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    path: PathBuf,
    entries: Vec<String>,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e == name)
    }

    /// Add an in-memory entry to the finished archive.
    pub fn append(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut zip = ZipWriter::new_append(file)?;
        zip.start_file(name, file_options())?;
        zip.write_all(content)?;
        zip.finish()?;
        self.entries.push(name.to_string());
        Ok(())
    }
}

/// Streams files into a new archive.
pub(crate) struct ArchiveBuilder {
    path: PathBuf,
    zip: ZipWriter<File>,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            zip: ZipWriter::new(File::create(path)?),
            entries: Vec::new(),
        })
    }

    /// Copy the file at `source` into the archive as `name`.
    ///
    /// On error the archive is left as it was before the call, so the
    /// caller can record the failure and keep adding files.
    pub fn add_file(&mut self, name: &str, source: &Path) -> Result<()> {
        let mut file = File::open(source)?;
        self.zip.start_file(name, file_options())?;
        if let Err(e) = std::io::copy(&mut file, &mut self.zip) {
            self.zip.abort_file()?;
            return Err(e.into());
        }
        self.entries.push(name.to_string());
        Ok(())
    }

    pub fn finish(self) -> Result<Archive> {
        self.zip.finish()?;
        Ok(Archive {
            path: self.path,
            entries: self.entries,
        })
    }
}

/// Result of a finished job: the archive plus the job's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    archive_path: PathBuf,
    work_dir: PathBuf,
    output_dir: Option<PathBuf>,
}

impl ArchiveHandle {
    pub fn new(archive_path: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            archive_path,
            work_dir,
            output_dir: None,
        }
    }

    /// Record where the renamed files were committed.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Read the archive and remove the working directory.
    pub fn read_and_discard(self) -> std::io::Result<Vec<u8>> {
        let bytes = std::fs::read(&self.archive_path)?;
        self.discard();
        Ok(bytes)
    }

    /// Copy the archive to `dest`, then remove the working directory.
    ///
    /// If the copy fails the working directory is left in place, archive
    /// included, and the error is returned.
    pub fn persist(self, dest: &Path) -> std::io::Result<u64> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let written = std::fs::copy(&self.archive_path, dest)?;
        self.discard();
        Ok(written)
    }

    fn discard(self) {
        if let Err(e) = std::fs::remove_dir_all(&self.work_dir) {
            tracing::warn!(dir = %self.work_dir.display(), "Failed to remove job directory: {}", e);
        }
    }
}
