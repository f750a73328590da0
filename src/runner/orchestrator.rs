//! Drives discovery, descriptor building, submission and aggregation for
//! one job family.

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;

use super::cancel::CancelToken;
use crate::aggregate::{OutcomeAggregator, RunSummary};
use crate::builder::{self, RunSettings};
use crate::config::DEFAULT_INPUT_PATTERN;
use crate::discovery::{self, DiscoveryFilter};
use crate::domain::{JobDescriptor, JobFamily, SubmissionResult, TaxonomyPath, WorkUnit};
use crate::error::{OrchestrateError, Result};
use crate::submit::Submitter;

/// A discovered unit with its descriptor.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub unit: WorkUnit,
    pub descriptor: JobDescriptor,
}

/// Every job of a run, built and checked before anything is submitted.
#[derive(Debug, Clone)]
pub struct Plan {
    family: JobFamily,
    jobs: Vec<PlannedJob>,
}

impl Plan {
    pub fn family(&self) -> JobFamily {
        self.family
    }

    pub fn jobs(&self) -> &[PlannedJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Summary with discovered counts only, as reported for a dry run.
    pub fn summary(&self) -> RunSummary {
        let aggregator = OutcomeAggregator::new(self.family);
        for job in &self.jobs {
            aggregator.record_discovered(&job.unit);
        }
        aggregator.report()
    }
}

pub struct Orchestrator {
    family: JobFamily,
    settings: RunSettings,
    input_pattern: String,
    filter: DiscoveryFilter,
    workers: usize,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(family: JobFamily, settings: RunSettings) -> Self {
        Self {
            family,
            settings,
            input_pattern: DEFAULT_INPUT_PATTERN.to_string(),
            filter: DiscoveryFilter::new(),
            workers: 1,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_input_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.input_pattern = pattern.into();
        self
    }

    pub fn with_filter(mut self, filter: DiscoveryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Concurrent submissions for the scheduler families. Ignored for the
    /// synchronous family.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn family(&self) -> JobFamily {
        self.family
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Discover units and build every descriptor. Fails on the first
    /// configuration or discovery problem, or when two units would share a
    /// job name.
    pub fn plan(&self) -> Result<Plan> {
        self.settings.validate(self.family)?;
        if self.settings.ignores_since() {
            warn!(
                "--since is ignored for {}: no since_flag is configured for its program",
                self.family
            );
        }
        let root = self
            .settings
            .input_root
            .as_ref()
            .ok_or_else(|| OrchestrateError::Configuration("input root is not set".to_string()))?;

        let units = discovery::discover(root, self.family, &self.input_pattern, &self.filter)?;
        info!("Discovered {} {} units under {}", units.len(), self.family, root.display());

        let mut names: HashMap<String, TaxonomyPath> = HashMap::new();
        let mut jobs = Vec::with_capacity(units.len());
        for unit in units {
            let descriptor = builder::build(&unit, self.family, &self.settings)?;
            if let Some(previous) = names.insert(descriptor.name.clone(), unit.path().clone()) {
                return Err(OrchestrateError::Configuration(format!(
                    "job name '{}' is shared by {} and {}",
                    descriptor.name,
                    previous,
                    unit.path()
                )));
            }
            jobs.push(PlannedJob { unit, descriptor });
        }

        Ok(Plan {
            family: self.family,
            jobs,
        })
    }

    /// Plan and execute the whole run.
    pub async fn run(&self, submitter: &dyn Submitter) -> Result<RunSummary> {
        let plan = self.plan()?;
        self.execute(plan, submitter).await
    }

    /// Submit every planned job in discovery order, stopping early when
    /// cancelled. Per-unit failures are recorded, never returned.
    pub async fn execute(&self, plan: Plan, submitter: &dyn Submitter) -> Result<RunSummary> {
        let aggregator = OutcomeAggregator::new(self.family);
        for job in plan.jobs() {
            aggregator.record_discovered(&job.unit);
        }
        if plan.is_empty() {
            info!("Nothing to do for {}", self.family);
            return Ok(aggregator.report());
        }

        fs::create_dir_all(&self.settings.logs_dir)?;

        let workers = if self.family.is_synchronous() { 1 } else { self.workers };
        info!(
            "Running {} {} jobs via {} ({} worker(s))",
            plan.len(),
            self.family,
            submitter.description(),
            workers
        );

        if workers == 1 {
            for job in plan.jobs {
                if self.cancel.is_cancelled() {
                    break;
                }
                self.process(job, submitter, &aggregator).await;
            }
        } else {
            let aggregator = &aggregator;
            stream::iter(plan.jobs)
                .for_each_concurrent(workers, move |job| async move {
                    if !self.cancel.is_cancelled() {
                        self.process(job, submitter, aggregator).await;
                    }
                })
                .await;
        }

        let summary = aggregator.report();
        if self.cancel.is_cancelled() && summary.totals.attempted < summary.totals.discovered {
            warn!(
                "Run cancelled after {} of {} units",
                summary.totals.attempted, summary.totals.discovered
            );
            aggregator.mark_cancelled();
            return Ok(aggregator.report());
        }
        Ok(summary)
    }

    async fn process(&self, job: PlannedJob, submitter: &dyn Submitter, aggregator: &OutcomeAggregator) {
        let PlannedJob { unit, descriptor } = job;
        debug!("Submitting {}: {}", descriptor.name, descriptor.command_line());
        let result = submitter.submit(descriptor).await;
        match &result {
            SubmissionResult::Submitted { .. } | SubmissionResult::Completed { .. } => {
                info!("{} {}: {}", self.family, unit.path(), result);
            }
            SubmissionResult::Failed { .. } | SubmissionResult::SubmissionRejected { .. } => {
                warn!("{} {}: {}", self.family, unit.path(), result);
            }
        }
        aggregator.record(&unit, &result);
    }
}
