//! Scheduler client trait and an in-memory implementation.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{JobDescriptor, JobHandle};

/// Client-side view of the external batch scheduler. Implementations must
/// tolerate concurrent `submit` calls.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Hand one descriptor to the scheduler. Never polls the job afterwards.
    async fn submit(&self, descriptor: &JobDescriptor) -> Result<JobHandle, SubmissionError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Reasons a scheduler submission did not yield a job handle
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Scheduler rejected job: {0}")]
    Rejected(String),

    #[error("Failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Submission timed out after {0}ms; the job may still have been queued, check squeue before resubmitting")]
    TimedOut(u64),

    #[error("Unexpected scheduler response: {0}")]
    MalformedResponse(String),
}

type RejectFn = Box<dyn Fn(&JobDescriptor) -> Option<String> + Send + Sync>;

/// Scheduler stand-in that accepts everything (or what a predicate allows)
/// and remembers what it was given.
pub struct MockScheduler {
    next_id: AtomicU64,
    submitted: Mutex<Vec<JobDescriptor>>,
    reject: Option<RejectFn>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            submitted: Mutex::new(Vec::new()),
            reject: None,
        }
    }

    /// Reject every descriptor for which `reject` returns a message.
    pub fn rejecting<F>(reject: F) -> Self
    where
        F: Fn(&JobDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            reject: Some(Box::new(reject)),
            ..Self::new()
        }
    }

    /// Descriptors accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<JobDescriptor> {
        self.submitted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchedulerClient for MockScheduler {
    async fn submit(&self, descriptor: &JobDescriptor) -> Result<JobHandle, SubmissionError> {
        if let Some(reject) = &self.reject {
            if let Some(message) = reject(descriptor) {
                return Err(SubmissionError::Rejected(message));
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(descriptor.clone());
        Ok(JobHandle(id.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
