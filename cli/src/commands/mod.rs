use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docsort_core::jobs::AUDIT_LOG_ENTRY;
use docsort_core::{
    read_spreadsheet, BatchRequest, Config, DocumentExtractor, FileRecord, JobCoordinator,
    JobProgress, NamingStrategy, SpreadsheetFilter, TokioWorker,
};
use serde::Serialize;

use crate::cli::{BatchArgs, Command};
use crate::error::{CommandError, CommandResult, ResultExt};

/// How often a running job is polled
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Printed when a batch completes
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job_id: String,
    pub documents: usize,
    pub archive: PathBuf,
    pub archive_bytes: u64,
    /// Where the renamed files were committed
    pub renamed_dir: Option<PathBuf>,
    pub progress: JobProgress,
    /// Whether the archive carries the audit log
    pub audit_log: Option<String>,
}

/// Run one batch command: submit, wait, take the archive once, write it out.
pub async fn execute(command: Command) -> CommandResult<RunSummary> {
    let args = command.batch().clone();
    let config = build_config(&args);
    config.ensure_dirs().storage_err()?;

    let strategy = naming_strategy(command).await?;
    let documents = collect_documents(&args.inputs, args.copy).await?;
    let count = documents.len();
    tracing::info!(documents = count, copy = args.copy, "Collected documents");

    let coordinator = JobCoordinator::new(
        config,
        Arc::new(TokioWorker),
        Arc::new(DocumentExtractor::new()),
    );
    let job_id = coordinator
        .submit(BatchRequest::new(documents, strategy))
        .await?;

    let progress = wait_for(&coordinator, &job_id).await;
    let handle = coordinator.take_result(&job_id).await?;
    let renamed_dir = handle.output_dir().map(Path::to_path_buf);
    let archive = args.archive.clone();
    let kept = handle.archive_path().to_path_buf();
    let bytes = tokio::task::spawn_blocking(move || handle.persist(&archive))
        .await
        .internal_err()?
        .map_err(|e| {
            CommandError::storage(format!(
                "cannot write {}: {} (archive kept at {})",
                args.archive.display(),
                e,
                kept.display()
            ))
        })?;
    tracing::info!(archive = %args.archive.display(), bytes, "Archive written");

    Ok(RunSummary {
        job_id,
        documents: count,
        archive: args.archive,
        archive_bytes: bytes,
        renamed_dir,
        progress,
        audit_log: (!args.no_log).then(|| AUDIT_LOG_ENTRY.to_string()),
    })
}

/// Environment config with command line overrides applied.
pub fn build_config(args: &BatchArgs) -> Config {
    let mut config = Config::load_or_default();
    if let Some(work_dir) = &args.work_dir {
        config.work_dir = work_dir.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = Some(output.clone());
    }
    if let Some(policy) = args.unresolved {
        config.unresolved_policy = policy.into();
    }
    config.include_text_dump = args.text_dump;
    config.embed_audit_log = !args.no_log;
    config
}

async fn naming_strategy(command: Command) -> CommandResult<NamingStrategy> {
    match command {
        Command::Pattern {
            document_type,
            pattern,
            ..
        } => Ok(NamingStrategy::Pattern {
            document_type,
            pattern,
        }),
        Command::Sheet {
            sheet,
            find,
            name,
            extra,
            ..
        } => {
            let bytes = tokio::fs::read(&sheet).await.map_err(|e| {
                CommandError::configuration(format!("cannot read {}: {}", sheet.display(), e))
            })?;
            let table = read_spreadsheet(&bytes)
                .map_err(|e| CommandError::configuration(format!("{:#}", e)))?;
            let filter = SpreadsheetFilter::new(table, find, name, extra)?;
            Ok(NamingStrategy::Spreadsheet(filter))
        }
    }
}

/// Expand directories (one level, sorted) into file records.
///
/// With `copy`, content is read into memory so the originals stay where they
/// are. Otherwise records point at disk and are moved on commit.
pub async fn collect_documents(inputs: &[PathBuf], copy: bool) -> CommandResult<Vec<FileRecord>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(list_dir(input).await?);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            return Err(CommandError::configuration(format!(
                "input not found: {}",
                input.display()
            )));
        }
    }

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        if copy {
            let bytes = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            documents.push(FileRecord::from_bytes(&file_name, bytes));
        } else {
            documents.push(FileRecord::from_path(path));
        }
    }
    Ok(documents)
}

async fn list_dir(dir: &Path) -> CommandResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Poll until the job is done, logging progress as it changes.
async fn wait_for(coordinator: &JobCoordinator, job_id: &str) -> JobProgress {
    let mut last = None;
    loop {
        let progress = coordinator.poll(job_id).await;
        if progress.done || coordinator.registry().get(job_id).await.is_none() {
            return progress;
        }
        if last != Some(progress.current) && progress.total > 0 {
            tracing::info!(
                job_id,
                current = progress.current,
                total = progress.total,
                "Progress {:.0}%",
                progress.progress_percent
            );
            last = Some(progress.current);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests;
