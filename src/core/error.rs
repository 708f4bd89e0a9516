use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single job. Never crosses the worker boundary: workers turn
/// it into a failed [`Outcome`](crate::core::job::Outcome).
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Rejected(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("job cancelled before completion")]
    Cancelled,
    #[error("executor panicked: {message}")]
    Panicked { message: String },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to write batch report: {0}")]
    Output(#[source] io::Error),
    #[error("failed to configure interrupt handling: {0}")]
    Signal(#[from] nix::Error),
    #[error("batch has not finished yet")]
    NotFinished,
    #[error("batch aborted by interrupt ({completed} jobs completed, {abandoned} abandoned)")]
    Aborted { completed: usize, abandoned: usize },
}

impl BatchError {
    /// Process exit status for this error; 130 mirrors a shell's SIGINT
    /// convention.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchError::Aborted { .. } => 130,
            _ => 1,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BatchError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
