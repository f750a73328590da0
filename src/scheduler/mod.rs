//! Scheduler-facing side of submission.
//!
//! - **SchedulerClient**: the submission API (`submit(descriptor) -> handle`)
//! - **SbatchClient**: Slurm implementation using `sbatch --parsable --wrap`
//! - **MockScheduler**: in-memory client for tests and rehearsals
//! - **SubmitThrottle**: minimum delay between consecutive submissions

mod client;
mod sbatch;
mod throttle;

pub use client::{MockScheduler, SchedulerClient, SubmissionError};
pub use sbatch::{SbatchClient, parse_job_id};
pub use throttle::SubmitThrottle;
