//! Execution contexts for batch jobs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

/// A batch job ready to run. It reports into the registry itself.
pub type JobFuture = BoxFuture<'static, ()>;

/// Runs submitted jobs. One job, one execution context.
pub trait Worker: Send + Sync {
    fn spawn(&self, job: JobFuture);
}

/// Runs each job as a tokio task. Must be used inside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioWorker;

impl Worker for TokioWorker {
    fn spawn(&self, job: JobFuture) {
        tokio::spawn(job);
    }
}

/// Queues jobs until [`InlineWorker::run_all`] drives them, one at a time,
/// on the caller's task. Lets tests observe a job before and after it runs.
#[derive(Clone, Default)]
pub struct InlineWorker {
    queue: Arc<Mutex<VecDeque<JobFuture>>>,
}

impl InlineWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self) -> usize {
        self.lock().len()
    }

    /// Run queued jobs to completion, including jobs they submit.
    pub async fn run_all(&self) {
        loop {
            let next = self.lock().pop_front();
            match next {
                Some(job) => job.await,
                None => break,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<JobFuture>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Worker for InlineWorker {
    fn spawn(&self, job: JobFuture) {
        self.lock().push_back(job);
    }
}
