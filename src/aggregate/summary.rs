//! Run summary types.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::domain::JobFamily;
use crate::error::Result;

/// Outcome counters for one scope (the run, one method, one field, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub discovered: u64,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl Counters {
    /// `succeeded + failed == attempted <= discovered`
    pub fn is_consistent(&self) -> bool {
        self.succeeded + self.failed == self.attempted && self.attempted <= self.discovered
    }
}

/// Counters keyed by segment value for one taxonomy level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelBreakdown {
    /// Level name, e.g. `method`
    pub level: String,
    pub entries: BTreeMap<String, Counters>,
}

/// One failed unit, for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub unit: String,
    pub detail: String,
}

/// Snapshot of everything the aggregator knows about a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub family: JobFamily,
    pub totals: Counters,
    /// One breakdown per non-leaf level, root-most first
    pub levels: Vec<LevelBreakdown>,
    /// Counters per ancestor prefix of two or more segments (`spacy/text`)
    pub branches: BTreeMap<String, Counters>,
    pub failures: Vec<FailureRecord>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn new(family: JobFamily) -> Self {
        let names = family.level_names();
        let levels = names[..names.len() - 1]
            .iter()
            .map(|name| LevelBreakdown {
                level: name.to_string(),
                entries: BTreeMap::new(),
            })
            .collect();
        Self {
            family,
            totals: Counters::default(),
            levels,
            branches: BTreeMap::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }

    pub fn level(&self, name: &str) -> Option<&LevelBreakdown> {
        self.levels.iter().find(|l| l.level == name)
    }

    /// Counters for `value` at level `name`, e.g. `("method", "spacy")`.
    pub fn counters(&self, level: &str, value: &str) -> Option<&Counters> {
        self.level(level).and_then(|l| l.entries.get(value))
    }

    pub fn branch(&self, prefix: &str) -> Option<&Counters> {
        self.branches.get(prefix)
    }

    /// True when no unit failed.
    pub fn is_clean(&self) -> bool {
        self.totals.failed == 0
    }

    /// Process exit status for the run: 0 iff no unit failed.
    /// Cancellation alone does not make a run fail.
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() { 0 } else { 1 }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
