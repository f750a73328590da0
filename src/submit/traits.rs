//! The shared submission interface.

use async_trait::async_trait;

use crate::domain::{JobDescriptor, SubmissionResult};

/// Hands one descriptor off and reports what happened. Per-unit failures
/// are outcomes, never errors: the batch always continues.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Consume the descriptor. Called at most once per descriptor.
    async fn submit(&self, descriptor: JobDescriptor) -> SubmissionResult;

    /// Short description for logs
    fn description(&self) -> &str;
}
