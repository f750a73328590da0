//! Synchronous in-process execution for the ner-clean family.

use async_trait::async_trait;
use log::{info, warn};
use std::fs::{self, File};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::traits::Submitter;
use crate::domain::{JobDescriptor, SubmissionResult};

/// Runs the descriptor's command as a child process with stdout/stderr
/// going to the descriptor's log files, and waits for it to exit.
///
/// The child is never killed by this runner; wall clock limits are the
/// job of an external timeout wrapper in the program argv.
#[derive(Debug, Default)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }

    fn open_log(path: &Path) -> std::io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)
    }

    async fn run(descriptor: &JobDescriptor) -> Result<std::process::ExitStatus, String> {
        let (program, args) = descriptor
            .command
            .split_first()
            .ok_or_else(|| "empty command".to_string())?;

        let stdout = Self::open_log(&descriptor.stdout_path)
            .map_err(|e| format!("cannot open {}: {}", descriptor.stdout_path.display(), e))?;
        let stderr = Self::open_log(&descriptor.stderr_path)
            .map_err(|e| format!("cannot open {}: {}", descriptor.stderr_path.display(), e))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| format!("cannot launch {}: {}", program, e))?;

        child
            .wait()
            .await
            .map_err(|e| format!("lost track of {}: {}", program, e))
    }
}

#[async_trait]
impl Submitter for LocalRunner {
    async fn submit(&self, descriptor: JobDescriptor) -> SubmissionResult {
        match Self::run(&descriptor).await {
            Ok(status) => match status.code() {
                Some(0) => {
                    info!("{} completed", descriptor.name);
                    SubmissionResult::Completed { exit_code: 0 }
                }
                Some(code) => {
                    warn!(
                        "{} failed with exit code {} (see {})",
                        descriptor.name,
                        code,
                        descriptor.stderr_path.display()
                    );
                    SubmissionResult::Failed {
                        exit_code: Some(code),
                        detail: format!("exited with status {}", code),
                    }
                }
                None => {
                    warn!("{} was terminated by a signal", descriptor.name);
                    SubmissionResult::Failed {
                        exit_code: None,
                        detail: "terminated by signal".to_string(),
                    }
                }
            },
            Err(detail) => {
                warn!("{} could not run: {}", descriptor.name, detail);
                SubmissionResult::Failed { exit_code: None, detail }
            }
        }
    }

    fn description(&self) -> &str {
        "local"
    }
}
