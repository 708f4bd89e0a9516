use std::io::Write;
use std::sync::Arc;

use crate::core::config::BatchConfig;
use crate::core::error::BatchError;
use crate::core::executor::Executor;
use crate::core::formatter::{
    format_abandoned_line, format_failure_line, format_report_line, FINISHED_NOTICE,
    TERMINATING_NOTICE,
};
use crate::core::pool::Pool;
use crate::core::signal::InterruptSource;
use crate::core::source::list_pending_jobs;
use crate::core::summary::BatchReport;

/// Runs one batch to completion or until `interrupt` fires.
///
/// The calling thread only ever blocks inside a poll bounded by
/// `config.poll_interval`, so an interrupt is noticed within one interval.
/// Per-job failures are written to `out` and do not fail the batch; an
/// interrupt returns [`BatchError::Aborted`].
pub fn run_batch(
    config: &BatchConfig,
    executor: Arc<dyn Executor>,
    interrupt: &dyn InterruptSource,
    out: &mut dyn Write,
) -> Result<BatchReport, BatchError> {
    config.validate()?;
    let jobs = list_pending_jobs(&config.source)?;

    tracing::info!(
        input_dir = %config.source.input_dir.display(),
        output_dir = %config.source.output_dir.display(),
        workers = config.workers,
        "starting batch"
    );
    let mut handle = Pool::new(config.workers, executor)?.start(jobs)?;

    loop {
        if interrupt.interrupted() {
            writeln!(out, "{TERMINATING_NOTICE}").map_err(BatchError::Output)?;
            handle.cancel();
            let report = handle.join();
            for job in &report.abandoned {
                writeln!(out, "{}", format_abandoned_line(job)).map_err(BatchError::Output)?;
            }
            tracing::info!("{}", format_report_line(&report));
            return Err(BatchError::Aborted {
                completed: report.outcomes.len(),
                abandoned: report.abandoned.len(),
            });
        }

        if handle.poll(config.poll_interval).done {
            break;
        }
        tracing::debug!(
            dispatched = handle.dispatched(),
            completed = handle.completed(),
            "batch still running"
        );
    }

    let report = handle.join();
    for failure in report.failures() {
        writeln!(out, "{}", format_failure_line(failure)).map_err(BatchError::Output)?;
    }
    writeln!(out, "{FINISHED_NOTICE}").map_err(BatchError::Output)?;
    tracing::info!("{}", format_report_line(&report));

    Ok(report)
}
