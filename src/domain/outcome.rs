//! Submission outcomes.

use serde::Serialize;
use std::fmt;

use super::descriptor::JobHandle;

/// Externally observed status of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionStatus {
    Submitted,
    Completed,
    Failed,
    SubmissionRejected,
}

/// Outcome of handing one descriptor to the scheduler or running it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// Accepted by the scheduler
    Submitted { handle: JobHandle },
    /// Local run exited 0
    Completed { exit_code: i32 },
    /// Local run exited non-zero, or could not be launched (`exit_code` is None)
    Failed { exit_code: Option<i32>, detail: String },
    /// Scheduler declined the descriptor
    SubmissionRejected { message: String },
}

impl SubmissionResult {
    pub fn status(&self) -> SubmissionStatus {
        match self {
            SubmissionResult::Submitted { .. } => SubmissionStatus::Submitted,
            SubmissionResult::Completed { .. } => SubmissionStatus::Completed,
            SubmissionResult::Failed { .. } => SubmissionStatus::Failed,
            SubmissionResult::SubmissionRejected { .. } => SubmissionStatus::SubmissionRejected,
        }
    }

    /// Submitted and Completed count as success.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmissionResult::Submitted { .. } | SubmissionResult::Completed { .. }
        )
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SubmissionResult::Completed { exit_code } => Some(*exit_code),
            SubmissionResult::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    pub fn job_handle(&self) -> Option<&JobHandle> {
        match self {
            SubmissionResult::Submitted { handle } => Some(handle),
            _ => None,
        }
    }

    /// Diagnostic for failed outcomes.
    pub fn detail(&self) -> Option<&str> {
        match self {
            SubmissionResult::Failed { detail, .. } => Some(detail),
            SubmissionResult::SubmissionRejected { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionResult::Submitted { handle } => write!(f, "submitted as job {}", handle),
            SubmissionResult::Completed { exit_code } => write!(f, "completed (exit {})", exit_code),
            SubmissionResult::Failed {
                exit_code: Some(code),
                detail,
            } => write!(f, "failed (exit {}): {}", code, detail),
            SubmissionResult::Failed { exit_code: None, detail } => write!(f, "failed to launch: {}", detail),
            SubmissionResult::SubmissionRejected { message } => write!(f, "rejected by scheduler: {}", message),
        }
    }
}
