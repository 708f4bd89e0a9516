use std::path::PathBuf;

use crate::core::error::JobError;

/// One unit of work: read `input_path`, produce `output_path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl Job {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    pub fn input_name(&self) -> Option<&str> {
        self.input_path.file_name().and_then(|name| name.to_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
}

impl Outcome {
    pub fn succeeded(job: Job) -> Self {
        Self {
            input_path: job.input_path,
            output_path: job.output_path,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(job: Job, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "unknown error".to_string();
        }
        Self {
            input_path: job.input_path,
            output_path: job.output_path,
            success: false,
            error_message: Some(message),
        }
    }

    pub fn from_result(job: Job, result: Result<(), JobError>) -> Self {
        match result {
            Ok(()) => Self::succeeded(job),
            Err(err) => Self::failed(job, err.to_string()),
        }
    }
}
