use std::time::Duration;

use crate::core::job::{Job, Outcome};
use crate::core::summary::BatchReport;

pub const TERMINATING_NOTICE: &str = "Terminating pool!";
pub const FINISHED_NOTICE: &str = "Finished processing!";

pub fn format_failure_line(outcome: &Outcome) -> String {
    let error = outcome.error_message.as_deref().unwrap_or("unknown error");
    format!(
        "{} failed to be processed with error: {error}",
        outcome.input_path.display()
    )
}

pub fn format_abandoned_line(job: &Job) -> String {
    format!(
        "{} was abandoned before completion (status unknown)",
        job.input_path.display()
    )
}

pub fn format_report_line(report: &BatchReport) -> String {
    format!(
        "Summary: processed={} succeeded={} failed={} abandoned={} elapsed={}",
        report.outcomes.len(),
        report.succeeded(),
        report.failed(),
        report.abandoned.len(),
        format_duration(report.elapsed)
    )
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
