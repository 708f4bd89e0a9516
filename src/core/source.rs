use std::fs::{self, ReadDir};
use std::path::PathBuf;

use crate::core::config::{NamingRule, SourceConfig};
use crate::core::error::BatchError;
use crate::core::job::Job;

/// Lazy, single-pass sequence of jobs whose output does not exist yet.
/// Call [`list_pending_jobs`] again to start over.
#[derive(Debug)]
pub struct PendingJobs {
    entries: ReadDir,
    output_dir: PathBuf,
    naming: NamingRule,
}

/// Prepares the output directory and returns the pending jobs in
/// directory-listing order.
pub fn list_pending_jobs(config: &SourceConfig) -> Result<PendingJobs, BatchError> {
    let entries = fs::read_dir(&config.input_dir)
        .map_err(|e| BatchError::filesystem(&config.input_dir, e))?;

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| BatchError::filesystem(&config.output_dir, e))?;

    Ok(PendingJobs {
        entries,
        output_dir: config.output_dir.clone(),
        naming: config.naming.clone(),
    })
}

impl Iterator for PendingJobs {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !self.naming.matches(name) {
                continue;
            }
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let output_path = self.output_dir.join(self.naming.output_name(name));
            if output_path.exists() {
                tracing::debug!(output = %output_path.display(), "output exists, skipping");
                continue;
            }

            return Some(Job {
                input_path: entry.path(),
                output_path,
            });
        }
    }
}
