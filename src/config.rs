//! Configuration for orchestrate.
//!
//! Loaded from `--config`, `./orchestrate.yml` or
//! `~/.config/orchestrate/orchestrate.yml`, falling back to defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::JobFamily;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Scheduler account charged for every job
    pub account: Option<String>,
    /// Flat directory receiving one stdout/stderr pair per unit
    pub logs_dir: PathBuf,
    pub scheduler: SchedulerConfig,
    pub scrape: FamilyConfig,
    pub ner_analyze: FamilyConfig,
    pub ner_clean: FamilyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Submission executable
    pub command: String,
    /// Extra arguments passed to every submission (e.g. `--mail-type=FAIL`)
    pub extra_args: Vec<String>,
    /// Courtesy delay between consecutive submissions
    pub submit_delay_ms: u64,
    /// Upper bound on a single submission call
    pub submit_timeout_ms: u64,
    /// Concurrent submissions for the scheduler families
    pub max_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            command: "sbatch".to_string(),
            extra_args: Vec::new(),
            submit_delay_ms: 1000,
            submit_timeout_ms: 30000,
            max_workers: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyConfig {
    /// Program argv prefix, e.g. `["python3", "scrape_article.py"]`
    pub program: Option<Vec<String>>,
    /// Extra program arguments appended after the family arguments
    pub extra_args: Vec<String>,
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    /// Scraper source configuration passed as `-c` (scrape only)
    pub scraper_config: Option<PathBuf>,
    /// Flag the program takes a date floor with, e.g. `--since`
    pub since_flag: Option<String>,
    /// Glob matched against leaf file names (default `*.json`)
    pub input_pattern: Option<String>,
    pub resources: Option<ResourcePolicy>,
}

/// Fixed per-family resource policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    pub cpus: u32,
    pub wall_clock_mins: u32,
    #[serde(default = "default_partition")]
    pub partition: String,
}

fn default_partition() -> String {
    "standard".to_string()
}

impl ResourcePolicy {
    /// Default policy table.
    pub fn for_family(family: JobFamily) -> Self {
        let (cpus, wall_clock_mins) = match family {
            JobFamily::Scrape => (4, 12 * 60),
            JobFamily::NerAnalyze => (1, 2 * 60),
            JobFamily::NerClean => (1, 30),
        };
        Self {
            cpus,
            wall_clock_mins,
            partition: default_partition(),
        }
    }
}

/// Default external program for a family.
pub fn default_program(family: JobFamily) -> Vec<String> {
    let script = match family {
        JobFamily::Scrape => "scrape_article.py",
        JobFamily::NerAnalyze => "spacy_ner_analysis.py",
        JobFamily::NerClean => "clean_ner_results.py",
    };
    vec!["python3".to_string(), script.to_string()]
}

pub const DEFAULT_INPUT_PATTERN: &str = "*.json";

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            account: None,
            logs_dir: PathBuf::from("logs"),
            scheduler: SchedulerConfig::default(),
            scrape: FamilyConfig::default(),
            ner_analyze: FamilyConfig::default(),
            ner_clean: FamilyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        let local_config = PathBuf::from(format!("{}.yml", project_name));
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    pub fn family(&self, family: JobFamily) -> &FamilyConfig {
        match family {
            JobFamily::Scrape => &self.scrape,
            JobFamily::NerAnalyze => &self.ner_analyze,
            JobFamily::NerClean => &self.ner_clean,
        }
    }

    /// Program argv for a family, configured or default.
    pub fn program(&self, family: JobFamily) -> Vec<String> {
        self.family(family).program.clone().unwrap_or_else(|| default_program(family))
    }

    /// Resource policy for a family, configured or default.
    pub fn resources(&self, family: JobFamily) -> ResourcePolicy {
        self.family(family)
            .resources
            .clone()
            .unwrap_or_else(|| ResourcePolicy::for_family(family))
    }

    pub fn input_pattern(&self, family: JobFamily) -> &str {
        self.family(family).input_pattern.as_deref().unwrap_or(DEFAULT_INPUT_PATTERN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_policy_table() {
        let config = Config::default();
        assert_eq!(config.resources(JobFamily::Scrape).cpus, 4);
        assert_eq!(config.resources(JobFamily::Scrape).wall_clock_mins, 720);
        assert_eq!(config.resources(JobFamily::NerAnalyze).wall_clock_mins, 120);
        assert_eq!(config.resources(JobFamily::NerClean).wall_clock_mins, 30);
        assert_eq!(config.program(JobFamily::NerClean), vec!["python3", "clean_ner_results.py"]);
        assert_eq!(config.input_pattern(JobFamily::Scrape), "*.json");
        assert!(config.account.is_none());
        assert_eq!(config.scheduler.command, "sbatch");
        assert_eq!(config.scheduler.max_workers, 1);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
account: immigration-lab
scheduler:
  submit_delay_ms: 250
scrape:
  scraper_config: /home/lab/sources/chicago_tribune.yml
ner_analyze:
  since_flag: --since
ner_clean:
  input_root: /scratch/ner/raw
  output_root: /scratch/ner/cleaned
  extra_args: [--verbose]
  resources:
    cpus: 2
    wall_clock_mins: 45
"#,
        )
        .unwrap();
        assert_eq!(config.account.as_deref(), Some("immigration-lab"));
        assert_eq!(config.scheduler.submit_delay_ms, 250);
        assert_eq!(config.scheduler.command, "sbatch");
        assert_eq!(config.ner_clean.input_root, Some(PathBuf::from("/scratch/ner/raw")));
        assert_eq!(config.ner_clean.extra_args, vec!["--verbose"]);
        assert_eq!(config.ner_analyze.since_flag.as_deref(), Some("--since"));
        assert!(config.ner_clean.since_flag.is_none());
        assert_eq!(
            config.scrape.scraper_config,
            Some(PathBuf::from("/home/lab/sources/chicago_tribune.yml"))
        );
        assert_eq!(config.program(JobFamily::NerClean), default_program(JobFamily::NerClean));
        let clean = config.resources(JobFamily::NerClean);
        assert_eq!(clean.cpus, 2);
        assert_eq!(clean.wall_clock_mins, 45);
        assert_eq!(clean.partition, "standard");
        assert_eq!(config.resources(JobFamily::Scrape).cpus, 4);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "logs_dir: /tmp/joblogs\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.logs_dir, PathBuf::from("/tmp/joblogs"));
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(Config::from_yaml("scheduler: [unclosed").is_err());
    }

    #[test]
    fn test_family_lookup() {
        let mut config = Config::default();
        config.ner_analyze.input_pattern = Some("*.jsonl".to_string());
        assert_eq!(config.input_pattern(JobFamily::NerAnalyze), "*.jsonl");
        assert_eq!(config.input_pattern(JobFamily::Scrape), "*.json");
    }
}
