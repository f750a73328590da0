//! Job families and the article fields they operate on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Article field analyzed by the NER programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Text,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Text => "text",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A family of jobs sharing discovery depth, naming and submission mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobFamily {
    /// Article scraping, one scheduler job per link file
    Scrape,
    /// NER extraction, one scheduler job per scraped article file
    NerAnalyze,
    /// NER result cleaning, run in-process per method/field/article
    NerClean,
}

impl JobFamily {
    pub const ALL: [JobFamily; 3] = [JobFamily::Scrape, JobFamily::NerAnalyze, JobFamily::NerClean];

    /// Number of taxonomy levels below the work root.
    pub fn depth(&self) -> usize {
        match self {
            JobFamily::Scrape | JobFamily::NerAnalyze => 1,
            JobFamily::NerClean => 3,
        }
    }

    /// Names of the taxonomy levels, root-most first.
    pub fn level_names(&self) -> &'static [&'static str] {
        match self {
            JobFamily::Scrape | JobFamily::NerAnalyze => &["item"],
            JobFamily::NerClean => &["method", "field", "item"],
        }
    }

    /// Synchronous families run in-process instead of going to the scheduler.
    pub fn is_synchronous(&self) -> bool {
        matches!(self, JobFamily::NerClean)
    }

    /// Job name prefix. NER analysis is namespaced by field so title and
    /// text runs never share log files.
    pub fn name_prefix(&self, field: Field) -> String {
        match self {
            JobFamily::Scrape => "scrape".to_string(),
            JobFamily::NerAnalyze => format!("ner_{}", field),
            JobFamily::NerClean => "clean".to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobFamily::Scrape => "scrape",
            JobFamily::NerAnalyze => "ner-analyze",
            JobFamily::NerClean => "ner-clean",
        }
    }
}

impl fmt::Display for JobFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
