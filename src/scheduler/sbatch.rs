//! Slurm `sbatch` submission client.
//!
//! The descriptor's command is passed inline with `--wrap`, so no job
//! script is ever written to disk.

use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::client::{SchedulerClient, SubmissionError};
use crate::config::SchedulerConfig;
use crate::domain::{JobDescriptor, JobHandle};

pub struct SbatchClient {
    command: String,
    extra_args: Vec<String>,
    timeout_ms: u64,
}

impl SbatchClient {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            extra_args: Vec::new(),
            timeout_ms: 30000,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(config.command.clone())
            .with_extra_args(config.extra_args.clone())
            .timeout_ms(config.submit_timeout_ms)
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Full argument list for one submission.
    pub fn arguments(&self, descriptor: &JobDescriptor) -> Vec<String> {
        let resources = &descriptor.resources;
        let mut args = self.extra_args.clone();
        args.extend([
            "--parsable".to_string(),
            format!("--job-name={}", descriptor.name),
            format!("--cpus-per-task={}", resources.cpus),
            format!("--time={}", resources.time_limit()),
            format!("--partition={}", resources.partition),
            format!("--account={}", resources.account),
            format!("--output={}", descriptor.stdout_path.display()),
            format!("--error={}", descriptor.stderr_path.display()),
            "--wrap".to_string(),
            descriptor.command_line(),
        ]);
        args
    }
}

/// Parse `--parsable` output: `<jobid>[;<cluster>]`.
pub fn parse_job_id(stdout: &str) -> Result<JobHandle, SubmissionError> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let id = line.split(';').next().unwrap_or("").trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit() || c == '_') {
        return Err(SubmissionError::MalformedResponse(format!("'{}'", stdout.trim())));
    }
    Ok(JobHandle(id.to_string()))
}

#[async_trait]
impl SchedulerClient for SbatchClient {
    async fn submit(&self, descriptor: &JobDescriptor) -> Result<JobHandle, SubmissionError> {
        let args = self.arguments(descriptor);
        debug!("{} {}", self.command, args.join(" "));

        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SubmissionError::Launch {
                command: self.command.clone(),
                source,
            })?;

        let timeout = Duration::from_millis(self.timeout_ms);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| SubmissionError::Launch {
                command: self.command.clone(),
                source,
            })?,
            Err(_) => return Err(SubmissionError::TimedOut(self.timeout_ms)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                format!("{} exited with {:?}", self.command, output.status.code())
            } else {
                stderr.trim().to_string()
            };
            return Err(SubmissionError::Rejected(message));
        }

        parse_job_id(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        &self.command
    }
}
