//! Run orchestration: one family per run, cooperative cancellation, and an
//! optional bounded worker pool for the scheduler families.

mod cancel;
mod orchestrator;

pub use cancel::CancelToken;
pub use orchestrator::{Orchestrator, Plan, PlannedJob};
