//! Job descriptors: the fully resolved submission packet for one unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Resources requested from the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cpus: u32,
    pub wall_clock_mins: u32,
    pub partition: String,
    pub account: String,
}

impl ResourceRequest {
    /// Wall clock limit in scheduler time format (`HH:MM:SS`, or
    /// `D-HH:MM:SS` from one day upward).
    pub fn time_limit(&self) -> String {
        let days = self.wall_clock_mins / (24 * 60);
        let hours = (self.wall_clock_mins / 60) % 24;
        let mins = self.wall_clock_mins % 60;
        if days > 0 {
            format!("{}-{:02}:{:02}:00", days, hours, mins)
        } else {
            format!("{:02}:{:02}:00", hours, mins)
        }
    }
}

/// Immutable, fully resolved description of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub name: String,
    pub resources: ResourceRequest,
    /// argv of the external program, no unexpanded variables
    pub command: Vec<String>,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl JobDescriptor {
    /// Command rendered as a single shell-safe line.
    pub fn command_line(&self) -> String {
        self.command.iter().map(|arg| shell_quote(arg)).collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [cpus={} time={} partition={} account={}] {}",
            self.name,
            self.resources.cpus,
            self.resources.time_limit(),
            self.resources.partition,
            self.resources.account,
            self.command_line()
        )
    }
}

/// Quote one argument for `sh`. Plain words pass through unchanged.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '+' | '@'));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Opaque scheduler-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
