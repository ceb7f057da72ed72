//! Job registry for in-flight batches
//!
//! Tracks in-memory progress and results of submitted batches. No persistence.
//! Each job is written by the one worker that owns it, read by any number of
//! pollers, and removed by the first successful `take_result`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::engine::ArchiveHandle;

/// Message of a freshly created job.
pub const PENDING_MESSAGE: &str = "pending";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job '{0}' already exists")]
    DuplicateId(String),
    #[error("job '{0}' not found")]
    NotFound(String),
}

/// Why a result could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TakeError {
    /// Unknown id, or the result was already taken.
    #[error("job not found")]
    NotFound,
    #[error("job is still running")]
    NotReady,
    /// The job finished without a result. The entry is gone after this.
    #[error("job failed: {message}")]
    Failed { message: String },
}

/// Bookkeeping for one job.
#[derive(Debug, Clone)]
pub struct JobState {
    pub id: String,
    pub current: usize,
    pub total: usize,
    pub done: bool,
    /// Set only when the job finished successfully.
    pub result: Option<ArchiveHandle>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobState {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            current: 0,
            total: 0,
            done: false,
            result: None,
            message: PENDING_MESSAGE.to_string(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn progress(&self) -> JobProgress {
        JobProgress {
            job_id: self.id.clone(),
            current: self.current,
            total: self.total,
            progress_percent: progress_percent(self.current, self.total),
            done: self.done,
            message: self.message.clone(),
        }
    }
}

/// What pollers see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub job_id: String,
    pub current: usize,
    pub total: usize,
    pub progress_percent: f64,
    pub done: bool,
    pub message: String,
}

impl JobProgress {
    /// Progress reported for ids the registry does not know.
    pub fn empty(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            current: 0,
            total: 0,
            progress_percent: 0.0,
            done: false,
            message: String::new(),
        }
    }
}

/// `(current + 1) / total * 100`, or 0 for an empty job.
///
/// `current` is the index of the document being processed, so the last
/// document already reads as 100%. Existing clients rely on this.
pub fn progress_percent(current: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current + 1) as f64 / total as f64 * 100.0
}

/// Tracks jobs in memory
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobState>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job. Ids must be unique.
    pub async fn create(&self, id: &str) -> Result<JobState, RegistryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(id) {
            return Err(RegistryError::DuplicateId(id.to_string()));
        }
        let state = JobState::new(id);
        jobs.insert(id.to_string(), state.clone());
        Ok(state)
    }

    /// Snapshot of a job, if known.
    pub async fn get(&self, id: &str) -> Option<JobState> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Progress of a job; empty progress for unknown ids.
    pub async fn poll(&self, id: &str) -> JobProgress {
        self.get(id)
            .await
            .map(|state| state.progress())
            .unwrap_or_else(|| JobProgress::empty(id))
    }

    /// Apply `mutator` to a job.
    ///
    /// `current` never moves backwards, a result is kept only on a finished
    /// job, and a finished job ignores further updates.
    pub async fn update<F>(&self, id: &str, mutator: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut JobState),
    {
        let mut jobs = self.jobs.write().await;
        let state = jobs
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        if state.done {
            tracing::debug!(job_id = %id, "Ignoring update to finished job");
            return Ok(());
        }

        let mut next = state.clone();
        mutator(&mut next);
        next.id = state.id.clone();
        next.created_at = state.created_at;
        next.current = next.current.max(state.current);
        if next.done {
            next.finished_at = Some(Utc::now());
        } else {
            next.result = None;
            next.finished_at = None;
        }
        *state = next;
        Ok(())
    }

    pub async fn set_total(&self, id: &str, total: usize) -> Result<(), RegistryError> {
        self.update(id, |s| s.total = total).await
    }

    pub async fn advance(&self, id: &str, current: usize) -> Result<(), RegistryError> {
        self.update(id, |s| s.current = current).await
    }

    /// Mark a job done. `None` records a failure.
    pub async fn finish(
        &self,
        id: &str,
        result: Option<ArchiveHandle>,
        message: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let message = message.into();
        self.update(id, move |s| {
            s.done = true;
            s.result = result;
            s.message = message;
        })
        .await
    }

    /// Take the result of a finished job, removing it from the registry.
    pub async fn take_result(&self, id: &str) -> Result<ArchiveHandle, TakeError> {
        let mut jobs = self.jobs.write().await;
        let Some(state) = jobs.get(id) else {
            return Err(TakeError::NotFound);
        };
        if !state.done {
            return Err(TakeError::NotReady);
        }

        let Some(state) = jobs.remove(id) else {
            return Err(TakeError::NotFound);
        };
        match state.result {
            Some(handle) => Ok(handle),
            None => Err(TakeError::Failed {
                message: state.message,
            }),
        }
    }

    /// Remove jobs that finished before `cutoff` and were never taken.
    /// Returns them so the caller can clean up their files.
    pub async fn evict_finished_before(&self, cutoff: DateTime<Utc>) -> Vec<JobState> {
        let mut jobs = self.jobs.write().await;
        let stale: Vec<String> = jobs
            .values()
            .filter(|s| s.finished_at.is_some_and(|t| t < cutoff))
            .map(|s| s.id.clone())
            .collect();
        let evicted: Vec<JobState> = stale.iter().filter_map(|id| jobs.remove(id)).collect();
        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted finished jobs");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn handle(name: &str) -> ArchiveHandle {
        ArchiveHandle::new(PathBuf::from(format!("/tmp/{name}.zip")), PathBuf::from("/tmp"))
    }

    #[tokio::test]
    async fn test_fresh_job_polls_empty() {
        let registry = JobRegistry::new();
        registry.create("a").await.unwrap();

        let progress = registry.poll("a").await;
        assert_eq!(progress.current, 0);
        assert_eq!(progress.total, 0);
        assert!(!progress.done);
        assert_eq!(progress.progress_percent, 0.0);
        assert_eq!(progress.message, PENDING_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_job_polls_empty() {
        let registry = JobRegistry::new();
        assert_eq!(registry.poll("nope").await, JobProgress::empty("nope"));
        assert!(registry.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let registry = JobRegistry::new();
        registry.create("a").await.unwrap();
        assert!(matches!(
            registry.create("a").await,
            Err(RegistryError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn test_take_result_lifecycle() {
        let registry = JobRegistry::new();
        registry.create("job").await.unwrap();
        registry.set_total("job", 2).await.unwrap();

        assert_eq!(registry.take_result("job").await, Err(TakeError::NotReady));

        registry.finish("job", Some(handle("h")), "done").await.unwrap();
        assert_eq!(registry.take_result("job").await, Ok(handle("h")));
        assert_eq!(registry.take_result("job").await, Err(TakeError::NotFound));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_job_is_removed_on_take() {
        let registry = JobRegistry::new();
        registry.create("job").await.unwrap();
        registry.finish("job", None, "disk full").await.unwrap();

        assert_eq!(
            registry.take_result("job").await,
            Err(TakeError::Failed {
                message: "disk full".to_string()
            })
        );
        assert_eq!(registry.take_result("job").await, Err(TakeError::NotFound));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_frozen_when_done() {
        let registry = JobRegistry::new();
        registry.create("job").await.unwrap();
        registry.set_total("job", 4).await.unwrap();
        registry.advance("job", 2).await.unwrap();
        registry.advance("job", 1).await.unwrap();
        assert_eq!(registry.poll("job").await.current, 2);

        registry.update("job", |s| s.result = Some(handle("early"))).await.unwrap();
        assert!(registry.get("job").await.unwrap().result.is_none());

        registry.finish("job", None, "failed").await.unwrap();
        registry.advance("job", 3).await.unwrap();
        registry.update("job", |s| s.done = false).await.unwrap();

        let state = registry.get("job").await.unwrap();
        assert!(state.done);
        assert_eq!(state.current, 2);
        assert!(state.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_job() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.advance("ghost", 1).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_evict_finished_before() {
        let registry = JobRegistry::new();
        registry.create("old").await.unwrap();
        registry.create("running").await.unwrap();
        registry.finish("old", Some(handle("old")), "done").await.unwrap();

        let evicted = registry
            .evict_finished_before(Utc::now() + chrono::Duration::seconds(1))
            .await;
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "old");
        assert_eq!(registry.len().await, 1);
        assert!(registry.get("running").await.is_some());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(0, 4), 25.0);
        assert_eq!(progress_percent(3, 4), 100.0);
        assert_eq!(progress_percent(1, 2), 100.0);
    }
}
