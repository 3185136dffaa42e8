use std::sync::atomic::{AtomicUsize, Ordering};
use serde::{Deserialize, Serialize};
use crate::core::{ItemReport, RunSummary};

/// Live completion counters for the running batch.
///
/// The batch driver is the only writer; any number of observers may read.
#[derive(Debug, Default)]
pub struct ProgressState {
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a run of `total` items with nothing completed.
    pub fn begin(&self, total: usize) {
        self.completed.store(0, Ordering::Release);
        self.total.store(total, Ordering::Release);
    }

    /// Counts one more item as completed and returns the new snapshot.
    pub fn advance(&self) -> Progress {
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.snapshot()
    }

    /// Back to zero at the end of a run.
    pub fn reset(&self) {
        self.completed.store(0, Ordering::Release);
        self.total.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> Progress {
        Progress::new(
            self.completed.load(Ordering::Acquire),
            self.total.load(Ordering::Acquire),
        )
    }
}

/// Point-in-time view of [`ProgressState`] for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Number of completed items, successful or not
    pub completed: usize,
    /// Number of items in the run
    pub total: usize,
    /// Progress percentage (0-100)
    pub percentage: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (completed * 100) / total
        } else {
            0
        };

        Self { completed, total, percentage }
    }
}

/// Severity of a human-readable log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Everything a front end can observe about a run, in emission order.
///
/// [`BatchEvent::Completed`] is always the last event of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum BatchEvent {
    /// Enumeration finished; `total` items will be processed
    Started { total: usize },
    /// Status line for the log view
    Log { level: LogLevel, message: String },
    /// One item finished, successfully or not
    ItemFinished { index: usize, report: ItemReport },
    /// Progress after the latest item
    Progress(Progress),
    /// Final summary
    Completed(RunSummary),
}
