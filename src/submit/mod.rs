//! Submission of job descriptors.
//!
//! Two implementations share the `Submitter` interface:
//! - `SchedulerSubmitter`: hands descriptors to the batch scheduler
//!   (scrape, ner-analyze)
//! - `LocalRunner`: runs the command in-process and waits (ner-clean)

pub mod batch;
pub mod local;
pub mod traits;

pub use batch::SchedulerSubmitter;
pub use local::LocalRunner;
pub use traits::Submitter;
