use std::collections::HashMap;
use std::mem;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::cancel::CancelToken;
use crate::core::error::BatchError;
use crate::core::executor::Executor;
use crate::core::job::{Job, Outcome};
use crate::core::summary::{BatchReport, BatchStatus};
use crate::core::worker::{self, WorkerContext};

#[derive(Debug)]
pub(crate) enum PoolEvent {
    Started { worker: usize, job: Job },
    Finished { worker: usize, outcome: Outcome },
    Exhausted { dispatched: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollStatus {
    pub done: bool,
}

/// A fixed-size set of worker threads that has not been started yet.
pub struct Pool {
    workers: usize,
    executor: Arc<dyn Executor>,
}

impl Pool {
    pub fn new(workers: usize, executor: Arc<dyn Executor>) -> Result<Self, BatchError> {
        if workers == 0 {
            return Err(BatchError::InvalidConfig {
                message: "worker count must be at least 1".to_string(),
            });
        }
        Ok(Self { workers, executor })
    }

    /// Spawns the workers and a dispatcher feeding them `jobs` in order.
    /// Returns as soon as the threads are running.
    pub fn start<I>(self, jobs: I) -> Result<BatchHandle, BatchError>
    where
        I: IntoIterator<Item = Job>,
        I::IntoIter: Send + 'static,
    {
        let cancel = CancelToken::new();
        let (job_tx, job_rx) = mpsc::sync_channel::<Job>(self.workers);
        let (event_tx, event_rx) = mpsc::channel::<PoolEvent>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut handle = BatchHandle {
            state: PoolState::Running,
            cancel: cancel.clone(),
            events: event_rx,
            dispatcher: None,
            workers: Vec::with_capacity(self.workers),
            in_flight: HashMap::new(),
            outcomes: Vec::new(),
            dispatched: None,
            started: 0,
            disconnected: false,
            started_at: Instant::now(),
        };

        for index in 0..self.workers {
            let ctx = WorkerContext {
                index,
                jobs: Arc::clone(&job_rx),
                events: event_tx.clone(),
                executor: Arc::clone(&self.executor),
                cancel: cancel.clone(),
            };
            match worker::spawn(ctx) {
                Ok(thread) => handle.workers.push(thread),
                Err(err) => {
                    cancel.cancel();
                    drop(job_tx);
                    return Err(BatchError::Spawn(err));
                }
            }
        }
        drop(job_rx);

        let jobs = jobs.into_iter();
        let dispatcher = thread::Builder::new()
            .name("poolflow-dispatcher".to_string())
            .spawn(move || dispatch(jobs, job_tx, event_tx, cancel));
        match dispatcher {
            Ok(thread) => handle.dispatcher = Some(thread),
            Err(err) => {
                handle.cancel();
                return Err(BatchError::Spawn(err));
            }
        }

        tracing::debug!(workers = self.workers, "pool started");
        Ok(handle)
    }
}

fn dispatch<I>(jobs: I, queue: SyncSender<Job>, events: Sender<PoolEvent>, cancel: CancelToken)
where
    I: Iterator<Item = Job>,
{
    let mut dispatched = 0;
    for job in jobs {
        if cancel.is_cancelled() {
            tracing::debug!(dispatched, "dispatch stopped by cancellation");
            return;
        }
        if queue.send(job).is_err() {
            return;
        }
        dispatched += 1;
    }
    drop(queue);
    let _ = events.send(PoolEvent::Exhausted { dispatched });
}

/// A running batch. Must be [`join`](BatchHandle::join)ed; dropping it
/// cancels and joins implicitly.
pub struct BatchHandle {
    state: PoolState,
    cancel: CancelToken,
    events: Receiver<PoolEvent>,
    dispatcher: Option<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
    in_flight: HashMap<PathBuf, Job>,
    outcomes: Vec<Outcome>,
    dispatched: Option<usize>,
    started: usize,
    disconnected: bool,
    started_at: Instant,
}

impl BatchHandle {
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// Jobs handed to workers so far.
    pub fn dispatched(&self) -> usize {
        self.started
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    fn is_done(&self) -> bool {
        if self.disconnected {
            return true;
        }
        matches!(self.dispatched, Some(total) if self.outcomes.len() == total)
    }

    fn record(&mut self, event: PoolEvent) {
        match event {
            PoolEvent::Started { worker, job } => {
                tracing::trace!(worker, input = %job.input_path.display(), "dispatched");
                self.started += 1;
                self.in_flight.insert(job.output_path.clone(), job);
            }
            PoolEvent::Finished { worker, outcome } => {
                tracing::trace!(worker, input = %outcome.input_path.display(), success = outcome.success, "finished");
                self.in_flight.remove(&outcome.output_path);
                self.outcomes.push(outcome);
            }
            PoolEvent::Exhausted { dispatched } => {
                tracing::debug!(dispatched, "job source exhausted");
                self.dispatched = Some(dispatched);
            }
        }
    }

    /// Records every event already queued. Returns `false` once all senders
    /// are gone.
    fn drain_ready(&mut self) -> bool {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.record(event),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn mark_disconnected(&mut self) {
        if self.state == PoolState::Running {
            self.disconnected = true;
        }
    }

    /// Waits at most `timeout` for the batch to finish. Events that are
    /// already queued are always recorded, even with a zero timeout.
    pub fn poll(&mut self, timeout: Duration) -> PollStatus {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.drain_ready() {
                self.mark_disconnected();
                break;
            }
            if self.is_done() {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.events.recv_timeout(remaining) {
                Ok(event) => self.record(event),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.mark_disconnected();
                    break;
                }
            }
        }
        PollStatus {
            done: self.state == PoolState::Running && self.is_done(),
        }
    }

    /// Stops dispatching and tells workers to abandon in-flight jobs.
    /// Calling it again has no effect.
    pub fn cancel(&mut self) {
        if self.state != PoolState::Running {
            return;
        }
        self.cancel.cancel();
        self.state = PoolState::Draining;
        tracing::info!(in_flight = self.in_flight.len(), "cancelling batch");
    }

    pub fn collect_results(&self) -> Result<Vec<Outcome>, BatchError> {
        if self.state == PoolState::Running && self.is_done() {
            return Ok(self.outcomes.clone());
        }
        Err(BatchError::NotFinished)
    }

    /// Waits for every worker to exit and produces the final report. Blocks
    /// until the batch finishes unless [`cancel`](Self::cancel) was called.
    pub fn join(mut self) -> BatchReport {
        self.join_threads();

        let aborted = self.cancel.is_cancelled();

        let mut abandoned: Vec<Job> = mem::take(&mut self.in_flight).into_values().collect();
        abandoned.sort_by(|a, b| a.input_path.cmp(&b.input_path));
        for job in &abandoned {
            tracing::warn!(input = %job.input_path.display(), "job abandoned without outcome");
        }

        BatchReport {
            outcomes: mem::take(&mut self.outcomes),
            abandoned,
            status: if aborted {
                BatchStatus::Aborted
            } else {
                BatchStatus::Finished
            },
            elapsed: self.started_at.elapsed(),
        }
    }

    fn join_threads(&mut self) {
        for thread in self.workers.drain(..) {
            if thread.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
        if let Some(thread) = self.dispatcher.take() {
            if thread.join().is_err() {
                tracing::warn!("dispatcher thread panicked");
            }
        }
        self.drain_ready();
    }
}

impl Drop for BatchHandle {
    fn drop(&mut self) {
        if self.workers.is_empty() && self.dispatcher.is_none() {
            return;
        }
        self.cancel();
        self.join_threads();
    }
}
