use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::error::BatchError;

pub const DEFAULT_INPUT_DIR: &str = "input_files";
pub const DEFAULT_OUTPUT_DIR: &str = "output_files";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_JOB_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_REJECTED: [&str; 2] = ["input_file_1.txt", "input_file_2.txt"];

static DEFAULT_INPUT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.txt$").unwrap());

/// Maps input file names to output file names.
#[derive(Debug, Clone)]
pub struct NamingRule {
    pub pattern: Regex,
    pub from: String,
    pub to: String,
}

impl Default for NamingRule {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_INPUT_PATTERN.clone(),
            from: "input_".to_string(),
            to: "output_".to_string(),
        }
    }
}

impl NamingRule {
    pub fn for_extension(extension: &str) -> Result<Self, BatchError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(BatchError::InvalidConfig {
                message: "extension must not be empty".to_string(),
            });
        }
        let pattern = Regex::new(&format!(r"\.{}$", regex::escape(extension))).map_err(|e| {
            BatchError::InvalidConfig {
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            pattern,
            ..Self::default()
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }

    pub fn output_name(&self, file_name: &str) -> String {
        if self.from.is_empty() {
            return file_name.to_string();
        }
        file_name.replace(&self.from, &self.to)
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub naming: NamingRule,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            naming: NamingRule::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub delay: Duration,
    pub rejected: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_JOB_DELAY,
            rejected: DEFAULT_REJECTED.iter().map(|name| name.to_string()).collect(),
        }
    }
}

/// Everything one batch run needs, passed explicitly into each component.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub source: SourceConfig,
    pub executor: ExecutorConfig,
    pub workers: usize,
    pub poll_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            executor: ExecutorConfig::default(),
            workers: default_workers(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.workers == 0 {
            return Err(BatchError::InvalidConfig {
                message: "worker count must be at least 1".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(BatchError::InvalidConfig {
                message: "poll interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
