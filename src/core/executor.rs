use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::cancel::CancelToken;
use crate::core::config::ExecutorConfig;
use crate::core::error::JobError;
use crate::core::job::Job;

pub const REJECTION_MESSAGE: &str = "I don't like the look of this file...";

/// Turns one job's input into its output.
///
/// Implementations read only `job.input_path` and write only
/// `job.output_path`. Long waits should go through `cancel` so that an
/// interrupted batch is not held up by in-flight work; returning
/// [`JobError::Cancelled`] marks the job as abandoned.
pub trait Executor: Send + Sync {
    fn execute(&self, job: &Job, cancel: &CancelToken) -> Result<(), JobError>;
}

impl<F> Executor for F
where
    F: Fn(&Job, &CancelToken) -> Result<(), JobError> + Send + Sync,
{
    fn execute(&self, job: &Job, cancel: &CancelToken) -> Result<(), JobError> {
        self(job, cancel)
    }
}

/// Copies the input to the output after a simulated processing delay.
///
/// The output is staged in a temp file next to the target and renamed into
/// place once complete, so a cancelled job never leaves a partial file.
#[derive(Debug, Clone, Default)]
pub struct CopyExecutor {
    config: ExecutorConfig,
}

impl CopyExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    fn is_rejected(&self, job: &Job) -> bool {
        job.input_name()
            .map(|name| self.config.rejected.iter().any(|r| r == name))
            .unwrap_or(false)
    }
}

impl Executor for CopyExecutor {
    fn execute(&self, job: &Job, cancel: &CancelToken) -> Result<(), JobError> {
        if self.is_rejected(job) {
            return Err(JobError::Rejected(REJECTION_MESSAGE.to_string()));
        }

        let contents = fs::read(&job.input_path).map_err(|e| JobError::Read {
            path: job.input_path.clone(),
            source: e,
        })?;

        let write_err = |e: std::io::Error| JobError::Write {
            path: job.output_path.clone(),
            source: e,
        };
        let dir = job
            .output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
        staged.write_all(&contents).map_err(write_err)?;
        staged.flush().map_err(write_err)?;

        if cancel.wait_timeout(self.config.delay) {
            return Err(JobError::Cancelled);
        }

        staged
            .persist(&job.output_path)
            .map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
