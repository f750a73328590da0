//! CLI command definitions using clap.
//!
//! One subcommand per job family, each sharing the `RunArgs` group.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::builder::RunSettings;
use crate::config::Config;
use crate::discovery::DiscoveryFilter;
use crate::domain::{Field, JobFamily};

/// Orchestrate - batch job submission for the article scraping and NER pipeline
#[derive(Parser, Debug)]
#[command(name = "orchestrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit one scraping job per link file
    Scrape {
        #[command(flatten)]
        run: RunArgs,

        /// Directory receiving one scraped article file per link file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Scraper source configuration passed to the scraper
        #[arg(long)]
        scraper_config: Option<PathBuf>,
    },

    /// Submit one NER analysis job per scraped article file
    NerAnalyze {
        #[command(flatten)]
        run: RunArgs,

        /// Article field to analyze
        #[arg(long, value_enum, default_value_t = Field::Title)]
        field: Field,
    },

    /// Clean NER results in-process, one run per method/field/article
    NerClean {
        #[command(flatten)]
        run: RunArgs,

        /// Only clean results of this NER method
        #[arg(short, long)]
        method: Option<String>,

        /// Only clean results for this field
        #[arg(long, value_enum)]
        field: Option<Field>,
    },
}

/// Options shared by every family.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Work root to discover input files under
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Scheduler account
    #[arg(long)]
    pub account: Option<String>,

    /// Directory for per-job stdout/stderr files
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// CPUs per job, overriding the family policy
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cpus: Option<u32>,

    /// Only process articles published on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub since: Option<NaiveDate>,

    /// Concurrent scheduler submissions
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the jobs that would be submitted and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

impl Commands {
    pub fn family(&self) -> JobFamily {
        match self {
            Commands::Scrape { .. } => JobFamily::Scrape,
            Commands::NerAnalyze { .. } => JobFamily::NerAnalyze,
            Commands::NerClean { .. } => JobFamily::NerClean,
        }
    }

    pub fn run_args(&self) -> &RunArgs {
        match self {
            Commands::Scrape { run, .. } | Commands::NerAnalyze { run, .. } | Commands::NerClean { run, .. } => run,
        }
    }

    /// Resolve run settings: configuration first, command-line flags on top.
    pub fn settings(&self, config: &Config) -> RunSettings {
        let args = self.run_args();
        let mut settings = RunSettings::from_config(config, self.family());
        if let Some(root) = &args.root {
            settings = settings.with_input_root(root);
        }
        if let Some(account) = &args.account {
            settings = settings.with_account(account);
        }
        if let Some(logs_dir) = &args.logs_dir {
            settings = settings.with_logs_dir(logs_dir);
        }
        if let Some(cpus) = args.cpus {
            settings = settings.with_cpus(cpus);
        }
        if let Some(since) = args.since {
            settings = settings.with_since(since);
        }
        match self {
            Commands::Scrape {
                output, scraper_config, ..
            } => {
                if let Some(output) = output {
                    settings = settings.with_output_root(output);
                }
                if let Some(scraper_config) = scraper_config {
                    settings = settings.with_scraper_config(scraper_config);
                }
            }
            Commands::NerAnalyze { field, .. } => {
                settings = settings.with_field(*field);
            }
            Commands::NerClean { .. } => {}
        }
        settings
    }

    /// Discovery filter; only ner-clean restricts levels.
    pub fn filter(&self) -> DiscoveryFilter {
        let mut filter = DiscoveryFilter::new();
        if let Commands::NerClean { method, field, .. } = self {
            if let Some(method) = method {
                filter = filter.with_level(0, method.clone());
            }
            if let Some(field) = field {
                filter = filter.with_level(1, field.as_str());
            }
        }
        filter
    }
}
