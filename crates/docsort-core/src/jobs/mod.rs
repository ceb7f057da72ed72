//! Asynchronous batch jobs.
//!
//! ```text
//! submit()                     worker                         poll() / take_result()
//! ────────                     ──────                         ──────────────────────
//! validate strategy ──► registry.create(id)
//!        │                      │
//!        └──► worker.spawn ──► extract (blocking) ──► advance(current)   ◄── poll(id)
//!                               │
//!                               ▼
//!                        export archive (blocking)
//!                               │
//!                               ▼
//!                        finish(id, handle | None)                        ◄── take_result(id)
//! ```
//!
//! Configuration errors surface from `submit` before any job exists. Once a
//! job is running, it always ends with `done = true`: with a result handle on
//! success, without one on failure.

mod registry;
mod worker;

pub use registry::{
    progress_percent, JobProgress, JobRegistry, JobState, RegistryError, TakeError,
    PENDING_MESSAGE,
};
pub use worker::{InlineWorker, JobFuture, TokioWorker, Worker};

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;

use crate::config::Config;
use crate::engine::{ArchiveHandle, BatchEngine, UnresolvedPolicy};
use crate::error::{RenameError, Result};
use crate::extract::TextExtractor;
use crate::files::FileRecord;
use crate::resolve::NamingStrategy;

/// Shown to pollers while a job runs.
pub const RUNNING_MESSAGE: &str = "Please wait";
/// Name of the archive inside a job directory.
pub const ARCHIVE_FILE: &str = "archive.zip";
/// Archive entry holding the audit log.
pub const AUDIT_LOG_ENTRY: &str = "log.csv";
/// Archive entry holding every extracted line.
pub const TEXT_DUMP_ENTRY: &str = "text.csv";
/// Where renamed files go when no output dir is given.
pub const RENAMED_DIR: &str = "renamed";

/// One batch to run.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub documents: Vec<FileRecord>,
    pub strategy: NamingStrategy,
    /// Defaults to the configured policy
    pub policy: Option<UnresolvedPolicy>,
    /// Defaults to the configured output dir. Without one, uploads are
    /// committed inside the job directory and disk files under
    /// `<work_dir>/renamed/<job_id>`, which outlives the job.
    pub output_dir: Option<PathBuf>,
}

impl BatchRequest {
    pub fn new(documents: Vec<FileRecord>, strategy: NamingStrategy) -> Self {
        Self {
            documents,
            strategy,
            policy: None,
            output_dir: None,
        }
    }

    pub fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }
}

/// Everything a running job needs besides its engine.
struct JobContext {
    registry: JobRegistry,
    job_id: String,
    job_dir: PathBuf,
    output_dir: PathBuf,
    /// Originals may be moved under the job directory; never remove it.
    keep_job_dir: bool,
    embed_audit_log: bool,
    include_text_dump: bool,
}

/// Submits batches, and answers polls and downloads for them.
#[derive(Clone)]
pub struct JobCoordinator {
    registry: JobRegistry,
    worker: Arc<dyn Worker>,
    extractor: Arc<dyn TextExtractor>,
    config: Config,
}

impl JobCoordinator {
    pub fn new(config: Config, worker: Arc<dyn Worker>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            registry: JobRegistry::new(),
            worker,
            extractor,
            config,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate the request, register a job and hand it to the worker.
    /// Returns the job id immediately.
    pub async fn submit(&self, request: BatchRequest) -> Result<String> {
        let label = request.strategy.label();
        let resolver = request.strategy.into_resolver()?;
        self.evict_stale().await;
        let policy = request.policy.unwrap_or(self.config.unresolved_policy);
        let engine = BatchEngine::new(resolver, self.extractor.clone()).with_policy(policy);

        let job_id = uuid::Uuid::new_v4().to_string();
        self.registry.create(&job_id).await?;

        let job_dir = self.config.work_dir.join(&job_id);
        let moves_originals = request.documents.iter().any(|d| d.bytes().is_none());
        let output_dir = match request.output_dir.or_else(|| self.config.output_dir.clone()) {
            Some(dir) => dir,
            None if moves_originals => self.config.work_dir.join(RENAMED_DIR).join(&job_id),
            None => job_dir.join(RENAMED_DIR),
        };
        let keep_job_dir = moves_originals && output_dir.starts_with(&job_dir);

        tracing::info!(
            job_id = %job_id,
            documents = request.documents.len(),
            strategy = label,
            ?policy,
            output_dir = %output_dir.display(),
            "Batch submitted"
        );

        let ctx = JobContext {
            registry: self.registry.clone(),
            job_id: job_id.clone(),
            job_dir,
            output_dir,
            keep_job_dir,
            embed_audit_log: self.config.embed_audit_log,
            include_text_dump: self.config.include_text_dump,
        };
        self.worker
            .spawn(Box::pin(run_job(ctx, engine, request.documents)));
        Ok(job_id)
    }

    /// Drop jobs whose results were not taken within the retention period,
    /// along with their job directories. Returns how many were evicted.
    pub async fn evict_stale(&self) -> usize {
        let retention = chrono::Duration::from_std(self.config.job_retention)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let Some(cutoff) = chrono::Utc::now().checked_sub_signed(retention) else {
            return 0;
        };

        let evicted = self.registry.evict_finished_before(cutoff).await;
        for job in &evicted {
            if let Some(handle) = &job.result {
                remove_job_dir(handle.work_dir());
            }
        }
        evicted.len()
    }

    pub async fn poll(&self, job_id: &str) -> JobProgress {
        self.registry.poll(job_id).await
    }

    pub async fn take_result(&self, job_id: &str) -> std::result::Result<ArchiveHandle, TakeError> {
        self.registry.take_result(job_id).await
    }
}

/// Run a batch and always record a terminal state, even if it panics.
async fn run_job(ctx: JobContext, engine: BatchEngine, documents: Vec<FileRecord>) {
    let outcome = AssertUnwindSafe(run_batch(&ctx, engine, documents))
        .catch_unwind()
        .await;

    let (result, message) = match outcome {
        Ok(Ok(Some(handle))) => (Some(handle), "done".to_string()),
        Ok(Ok(None)) => (None, RenameError::EmptyBatch.to_string()),
        Ok(Err(e)) => {
            tracing::error!(job_id = %ctx.job_id, "Batch failed: {}", e);
            (None, e.to_string())
        }
        Err(_) => {
            tracing::error!(job_id = %ctx.job_id, "Batch panicked");
            (None, "internal error".to_string())
        }
    };

    if result.is_none() {
        if ctx.keep_job_dir {
            tracing::warn!(
                job_id = %ctx.job_id,
                dir = %ctx.job_dir.display(),
                "Keeping job directory with moved files"
            );
        } else {
            remove_job_dir(&ctx.job_dir);
        }
    }
    tracing::info!(job_id = %ctx.job_id, success = result.is_some(), "Batch finished");
    if let Err(e) = ctx.registry.finish(&ctx.job_id, result, message).await {
        tracing::warn!(job_id = %ctx.job_id, "Failed to record job result: {}", e);
    }
}

async fn run_batch(
    ctx: &JobContext,
    mut engine: BatchEngine,
    documents: Vec<FileRecord>,
) -> Result<Option<ArchiveHandle>> {
    let total = documents.len();
    ctx.registry
        .update(&ctx.job_id, |s| {
            s.total = total;
            s.message = RUNNING_MESSAGE.to_string();
        })
        .await?;

    let extractor = engine.extractor();
    for (index, record) in documents.into_iter().enumerate() {
        ctx.registry.advance(&ctx.job_id, index).await?;

        let extractor = extractor.clone();
        let (record, table) = tokio::task::spawn_blocking(move || {
            let table = extractor.extract(&record);
            (record, table)
        })
        .await
        .map_err(|e| RenameError::Internal(e.to_string()))?;

        engine.add_extracted(record, table);
    }

    let job_dir = ctx.job_dir.clone();
    let output_dir = ctx.output_dir.clone();
    let embed_audit_log = ctx.embed_audit_log;
    let include_text_dump = ctx.include_text_dump;
    tokio::task::spawn_blocking(move || {
        export(engine, &job_dir, &output_dir, embed_audit_log, include_text_dump)
    })
    .await
    .map_err(|e| RenameError::Internal(e.to_string()))?
}

fn export(
    mut engine: BatchEngine,
    job_dir: &Path,
    output_dir: &Path,
    embed_audit_log: bool,
    include_text_dump: bool,
) -> Result<Option<ArchiveHandle>> {
    let archive_path = job_dir.join(ARCHIVE_FILE);
    let Some(mut archive) = engine.export_to_archive(output_dir, &archive_path)? else {
        return Ok(None);
    };

    if embed_audit_log {
        archive.append(AUDIT_LOG_ENTRY, &engine.export_log().to_csv()?)?;
    }
    if include_text_dump {
        archive.append(TEXT_DUMP_ENTRY, &engine.extracted_text().to_csv()?)?;
    }
    Ok(Some(
        ArchiveHandle::new(archive.path().to_path_buf(), job_dir.to_path_buf())
            .with_output_dir(output_dir),
    ))
}

fn remove_job_dir(job_dir: &Path) {
    if !job_dir.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_dir_all(job_dir) {
        tracing::warn!(dir = %job_dir.display(), "Failed to remove job directory: {}", e);
    }
}
