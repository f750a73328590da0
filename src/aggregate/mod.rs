//! Outcome aggregation and reporting.
//!
//! `OutcomeAggregator` is created at run start and shared by reference with
//! every unit's processing step. `report` returns a `RunSummary` snapshot;
//! `render` turns it into the operator-facing text.

mod aggregator;
mod report;
mod summary;

pub use aggregator::OutcomeAggregator;
pub use report::render;
pub use summary::{Counters, FailureRecord, LevelBreakdown, RunSummary};
