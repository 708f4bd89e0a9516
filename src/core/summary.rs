use std::time::Duration;

use crate::core::job::{Job, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Finished,
    Aborted,
}

/// Final, immutable result of one batch.
///
/// Every job a worker started appears exactly once, either in `outcomes`
/// or in `abandoned`. Outcome order is worker completion order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
    pub abandoned: Vec<Job>,
    pub status: BatchStatus,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn is_aborted(&self) -> bool {
        self.status == BatchStatus::Aborted
    }
}
