//! Domain types for orchestrate
//!
//! - JobFamily / Field: what kind of work, and which article field it targets
//! - TaxonomyPath: validated method/field/item classification of a unit
//! - WorkUnit: one discovered input artifact
//! - JobDescriptor: the resolved submission packet for one unit
//! - SubmissionResult: what happened when the unit was handed off

pub mod descriptor;
pub mod family;
pub mod outcome;
pub mod taxonomy;
pub mod work_unit;

pub use descriptor::{JobDescriptor, JobHandle, ResourceRequest, shell_quote};
pub use family::{Field, JobFamily};
pub use outcome::{SubmissionResult, SubmissionStatus};
pub use taxonomy::{Segment, TaxonomyPath};
pub use work_unit::WorkUnit;
