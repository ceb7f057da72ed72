use std::path::PathBuf;
use std::time::Duration;

use crate::engine::UnresolvedPolicy;

/// Overrides the job working directory.
pub const WORK_DIR_ENV: &str = "DOCSORT_WORK_DIR";
/// `skip` or `keep-original`.
pub const UNRESOLVED_ENV: &str = "DOCSORT_UNRESOLVED";
/// Seconds a finished job waits to be taken before it is evicted.
pub const JOB_RETENTION_ENV: &str = "DOCSORT_JOB_RETENTION_SECS";

const DEFAULT_JOB_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Per-job working directories live here (~/.cache/docsort/jobs)
    pub work_dir: PathBuf,
    /// Where renamed files are placed; `None` picks a per-job directory
    pub output_dir: Option<PathBuf>,
    /// Default for batches that don't choose one
    pub unresolved_policy: UnresolvedPolicy,
    /// Add the audit log to every archive as `log.csv`
    pub embed_audit_log: bool,
    /// Add every extracted line to the archive as `text.csv`
    pub include_text_dump: bool,
    /// How long an untaken result is kept after its job finishes
    pub job_retention: Duration,
}

impl Config {
    /// Load configuration from the environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let work_dir = lookup(WORK_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::cache_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("docsort")
                    .join("jobs")
            });

        let unresolved_policy = match lookup(UNRESOLVED_ENV) {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring {}: {}", UNRESOLVED_ENV, e);
                UnresolvedPolicy::default()
            }),
            None => UnresolvedPolicy::default(),
        };

        let job_retention = match lookup(JOB_RETENTION_ENV) {
            Some(value) => value
                .trim()
                .parse()
                .map(Duration::from_secs)
                .unwrap_or_else(|e| {
                    tracing::warn!("Ignoring {}: {}", JOB_RETENTION_ENV, e);
                    DEFAULT_JOB_RETENTION
                }),
            None => DEFAULT_JOB_RETENTION,
        };

        Self {
            work_dir,
            output_dir: None,
            unresolved_policy,
            embed_audit_log: true,
            include_text_dump: false,
            job_retention,
        }
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(output_dir) = &self.output_dir {
            std::fs::create_dir_all(output_dir)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
