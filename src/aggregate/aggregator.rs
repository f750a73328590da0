//! Thread-safe outcome aggregation.
//!
//! Every update happens under one lock, so any snapshot taken with
//! `report` satisfies `succeeded + failed == attempted <= discovered`
//! even while other tasks are recording.

use std::sync::Mutex;

use super::summary::{Counters, FailureRecord, RunSummary};
use crate::domain::{JobFamily, SubmissionResult, WorkUnit};

pub struct OutcomeAggregator {
    inner: Mutex<RunSummary>,
}

impl OutcomeAggregator {
    pub fn new(family: JobFamily) -> Self {
        Self {
            inner: Mutex::new(RunSummary::new(family)),
        }
    }

    /// Count a discovered unit. Must precede `record` for that unit.
    pub fn record_discovered(&self, unit: &WorkUnit) {
        let mut summary = self.lock();
        apply(&mut summary, unit, |c| c.discovered += 1);
    }

    /// Record the outcome of one attempted unit.
    pub fn record(&self, unit: &WorkUnit, result: &SubmissionResult) {
        let success = result.is_success();
        let mut summary = self.lock();
        apply(&mut summary, unit, |c| {
            c.attempted += 1;
            if success {
                c.succeeded += 1;
            } else {
                c.failed += 1;
            }
        });
        if !success {
            summary.failures.push(FailureRecord {
                unit: unit.path().to_string(),
                detail: result.to_string(),
            });
        }
    }

    pub fn mark_cancelled(&self) {
        self.lock().cancelled = true;
    }

    /// Snapshot of the counters so far.
    pub fn report(&self) -> RunSummary {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunSummary> {
        // Counter updates cannot panic midway, so a poisoned lock still
        // holds consistent data.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Apply `update` to the totals and to every scope along the unit's path.
fn apply(summary: &mut RunSummary, unit: &WorkUnit, update: impl Fn(&mut Counters)) {
    update(&mut summary.totals);

    let ancestors = unit.path().ancestors();
    for (level, segment) in summary.levels.iter_mut().zip(ancestors) {
        update(level.entries.entry(segment.to_string()).or_default());
    }

    for end in 2..=ancestors.len() {
        let prefix = ancestors[..end]
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("/");
        update(summary.branches.entry(prefix).or_default());
    }
}
