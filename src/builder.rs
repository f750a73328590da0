//! Job descriptor builder.
//!
//! `build` is a pure function of the work unit, the family and the
//! resolved run settings: no I/O, no randomness, so the same inputs always
//! produce byte-identical descriptors.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::{Config, ResourcePolicy};
use crate::domain::{Field, JobDescriptor, JobFamily, ResourceRequest, TaxonomyPath, WorkUnit};
use crate::error::{OrchestrateError, Result};

/// Length of the digest suffix appended to sanitized segments.
const DIGEST_HEX_LEN: usize = 8;

/// Settings shared by every descriptor of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// External program argv prefix
    pub program: Vec<String>,
    /// Appended verbatim after the family arguments
    pub extra_args: Vec<String>,
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    /// Scraper source configuration (`-c`), scrape only
    pub scraper_config: Option<PathBuf>,
    pub logs_dir: PathBuf,
    pub account: Option<String>,
    pub resources: ResourcePolicy,
    /// Field analyzed by ner-analyze
    pub field: Field,
    /// Overrides the policy CPU count
    pub cpus: Option<u32>,
    /// Date floor forwarded to the external program
    pub since: Option<NaiveDate>,
    /// Flag carrying `since`; without one the date is not forwarded
    pub since_flag: Option<String>,
}

impl RunSettings {
    /// Resolve settings for `family` from configuration alone.
    pub fn from_config(config: &Config, family: JobFamily) -> Self {
        let family_config = config.family(family);
        Self {
            program: config.program(family),
            extra_args: family_config.extra_args.clone(),
            input_root: family_config.input_root.clone(),
            output_root: family_config.output_root.clone(),
            scraper_config: family_config.scraper_config.clone(),
            logs_dir: config.logs_dir.clone(),
            account: config.account.clone(),
            resources: config.resources(family),
            field: Field::Title,
            cpus: None,
            since: None,
            since_flag: family_config.since_flag.clone(),
        }
    }

    pub fn with_input_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.input_root = Some(root.into());
        self
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }

    pub fn with_scraper_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.scraper_config = Some(path.into());
        self
    }

    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_program(mut self, program: Vec<String>) -> Self {
        self.program = program;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.field = field;
        self
    }

    pub fn with_cpus(mut self, cpus: u32) -> Self {
        self.cpus = Some(cpus);
        self
    }

    pub fn with_since(mut self, since: NaiveDate) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_since_flag(mut self, flag: impl Into<String>) -> Self {
        self.since_flag = Some(flag.into());
        self
    }

    /// A date floor was requested but the program has no flag for it.
    pub fn ignores_since(&self) -> bool {
        self.since.is_some() && self.since_flag.is_none()
    }

    /// Check that every setting `family` requires is present.
    pub fn validate(&self, family: JobFamily) -> Result<()> {
        self.required_input_root()?;
        self.required_account()?;
        if family == JobFamily::Scrape {
            self.required_output_root()?;
            self.required_scraper_config()?;
        }
        if self.program.is_empty() {
            return Err(OrchestrateError::Configuration("external program is empty".to_string()));
        }
        if self.cpus == Some(0) || self.resources.cpus == 0 {
            return Err(OrchestrateError::Configuration("cpu count must be at least 1".to_string()));
        }
        Ok(())
    }

    fn required_input_root(&self) -> Result<&PathBuf> {
        self.input_root
            .as_ref()
            .ok_or_else(|| OrchestrateError::Configuration("input root is not set".to_string()))
    }

    fn required_output_root(&self) -> Result<&PathBuf> {
        self.output_root
            .as_ref()
            .ok_or_else(|| OrchestrateError::Configuration("output root is not set".to_string()))
    }

    fn required_scraper_config(&self) -> Result<&PathBuf> {
        self.scraper_config
            .as_ref()
            .ok_or_else(|| OrchestrateError::Configuration("scraper config is not set".to_string()))
    }

    fn required_account(&self) -> Result<&str> {
        match self.account.as_deref() {
            Some(account) if !account.trim().is_empty() => Ok(account),
            _ => Err(OrchestrateError::Configuration("scheduler account is not set".to_string())),
        }
    }
}

/// Build the descriptor for one unit.
///
/// Family arguments follow the external programs' own command lines:
/// - scrape: `-i <source> -o <output_root>/<item> -c <scraper_config> -n <cpus>`
/// - ner-analyze: `<item> --field <field>`
/// - ner-clean: `-f <item> -m <method> -fd <field>`
///
/// then `<since_flag> YYYY-MM-DD` when both are set, then `extra_args`.
pub fn build(unit: &WorkUnit, family: JobFamily, settings: &RunSettings) -> Result<JobDescriptor> {
    settings.validate(family)?;
    if unit.path().depth() != family.depth() {
        return Err(OrchestrateError::Configuration(format!(
            "{} expects {} taxonomy levels, unit {} has {}",
            family,
            family.depth(),
            unit.path(),
            unit.path().depth()
        )));
    }

    let account = settings.required_account()?;
    let name = job_name(family, settings.field, unit.path());
    let cpus = settings.cpus.unwrap_or(settings.resources.cpus);
    let resources = ResourceRequest {
        cpus,
        wall_clock_mins: settings.resources.wall_clock_mins,
        partition: settings.resources.partition.clone(),
        account: account.to_string(),
    };

    let mut command = settings.program.clone();
    let item = unit.item().as_str();
    match family {
        JobFamily::Scrape => {
            let output_root = settings.required_output_root()?;
            let scraper_config = settings.required_scraper_config()?;
            command.extend([
                "-i".to_string(),
                path_arg(unit.source_file()),
                "-o".to_string(),
                path_arg(&output_root.join(item)),
                "-c".to_string(),
                path_arg(scraper_config),
                "-n".to_string(),
                cpus.to_string(),
            ]);
        }
        JobFamily::NerAnalyze => {
            command.extend([item.to_string(), "--field".to_string(), settings.field.to_string()]);
        }
        JobFamily::NerClean => {
            // [method, field, item] is passed as item, method, field.
            let segments = unit.path().segments();
            command.extend([
                "-f".to_string(),
                item.to_string(),
                "-m".to_string(),
                segments[0].to_string(),
                "-fd".to_string(),
                segments[1].to_string(),
            ]);
        }
    }
    if let (Some(since), Some(flag)) = (settings.since, &settings.since_flag) {
        command.push(flag.clone());
        command.push(since.format("%Y-%m-%d").to_string());
    }
    command.extend(settings.extra_args.iter().cloned());

    Ok(JobDescriptor {
        stdout_path: settings.logs_dir.join(format!("{}.out", name)),
        stderr_path: settings.logs_dir.join(format!("{}.err", name)),
        name,
        resources,
        command,
    })
}

/// `<prefix>_<seg1>[_<seg2>][_<seg3>]`, scheduler- and filesystem-safe.
/// The item contributes its stem, so `herald.json` names `..._herald`.
pub fn job_name(family: JobFamily, field: Field, path: &TaxonomyPath) -> String {
    let mut name = family.name_prefix(field);
    let leaf = path.depth() - 1;
    for (level, segment) in path.segments().iter().enumerate() {
        let raw = if level == leaf {
            item_stem(segment.as_str())
        } else {
            segment.as_str()
        };
        name.push('_');
        name.push_str(&sanitize_segment(raw));
    }
    name
}

fn item_stem(item: &str) -> &str {
    match item.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => item,
    }
}

/// Replace characters outside `[A-Za-z0-9_]` with `_`. A segment that
/// needed replacement gets a digest of its raw form appended, so that
/// `a-b` and `a_b` map to different names.
pub fn sanitize_segment(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if sanitized == raw {
        return sanitized;
    }
    let digest = hex::encode(Sha256::digest(raw.as_bytes()));
    format!("{}_{}", sanitized, &digest[..DIGEST_HEX_LEN])
}

fn path_arg(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
