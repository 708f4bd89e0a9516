use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::core::cancel::CancelToken;
use crate::core::error::JobError;
use crate::core::executor::Executor;
use crate::core::job::{Job, Outcome};
use crate::core::pool::PoolEvent;
use crate::core::signal::block_interrupts_for_current_thread;

pub(crate) struct WorkerContext {
    pub index: usize,
    pub jobs: Arc<Mutex<Receiver<Job>>>,
    pub events: Sender<PoolEvent>,
    pub executor: Arc<dyn Executor>,
    pub cancel: CancelToken,
}

pub(crate) fn spawn(ctx: WorkerContext) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("poolflow-worker-{}", ctx.index))
        .spawn(move || run(ctx))
}

fn run(ctx: WorkerContext) {
    let span = tracing::debug_span!("worker", index = ctx.index);
    let _enter = span.enter();

    if let Err(err) = block_interrupts_for_current_thread() {
        tracing::warn!(error = %err, "could not block SIGINT in worker");
    }

    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        let next = match ctx.jobs.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => break,
        };
        let Ok(job) = next else {
            break;
        };

        // Picked up after cancellation: never started.
        if ctx.cancel.is_cancelled() {
            break;
        }

        if ctx
            .events
            .send(PoolEvent::Started {
                worker: ctx.index,
                job: job.clone(),
            })
            .is_err()
        {
            break;
        }

        tracing::debug!(input = %job.input_path.display(), "job started");
        let result = execute_guarded(ctx.executor.as_ref(), &job, &ctx.cancel);

        if matches!(result, Err(JobError::Cancelled)) && ctx.cancel.is_cancelled() {
            tracing::debug!(input = %job.input_path.display(), "job abandoned");
            break;
        }

        let outcome = Outcome::from_result(job, result);
        if !outcome.success {
            tracing::debug!(
                input = %outcome.input_path.display(),
                error = outcome.error_message.as_deref().unwrap_or_default(),
                "job failed"
            );
        }
        if ctx
            .events
            .send(PoolEvent::Finished {
                worker: ctx.index,
                outcome,
            })
            .is_err()
        {
            break;
        }
    }

    tracing::debug!("worker exiting");
}

fn execute_guarded(executor: &dyn Executor, job: &Job, cancel: &CancelToken) -> Result<(), JobError> {
    panic::catch_unwind(AssertUnwindSafe(|| executor.execute(job, cancel))).unwrap_or_else(
        |payload| {
            Err(JobError::Panicked {
                message: panic_message(payload.as_ref()),
            })
        },
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn context(
        executor: Arc<dyn Executor>,
    ) -> (mpsc::Sender<Job>, mpsc::Receiver<PoolEvent>, CancelToken, WorkerContext) {
        let (job_tx, job_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let ctx = WorkerContext {
            index: 0,
            jobs: Arc::new(Mutex::new(job_rx)),
            events: event_tx,
            executor,
            cancel: cancel.clone(),
        };
        (job_tx, event_rx, cancel, ctx)
    }

    #[test]
    fn panicking_executor_becomes_failed_outcome() {
        let executor: Arc<dyn Executor> =
            Arc::new(|_: &Job, _: &CancelToken| -> Result<(), JobError> { panic!("boom") });
        let (job_tx, events, _cancel, ctx) = context(executor);
        job_tx.send(Job::new("a.txt", "b.txt")).unwrap();
        drop(job_tx);

        spawn(ctx).unwrap().join().unwrap();

        let events: Vec<PoolEvent> = events.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[1] {
            PoolEvent::Finished { outcome, .. } => {
                assert!(!outcome.success);
                assert_eq!(
                    outcome.error_message.as_deref(),
                    Some("executor panicked: boom")
                );
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn cancelled_job_reports_no_outcome() {
        let executor: Arc<dyn Executor> =
            Arc::new(|_: &Job, cancel: &CancelToken| -> Result<(), JobError> {
                cancel.cancel();
                Err(JobError::Cancelled)
            });
        let (job_tx, events, cancel, ctx) = context(executor);
        job_tx.send(Job::new("a.txt", "b.txt")).unwrap();
        job_tx.send(Job::new("c.txt", "d.txt")).unwrap();

        spawn(ctx).unwrap().join().unwrap();

        assert!(cancel.is_cancelled());
        let events: Vec<PoolEvent> = events.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PoolEvent::Started { .. }));
    }
}
