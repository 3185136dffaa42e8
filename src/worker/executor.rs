//! Single-slot executor that runs batch jobs off the caller's thread.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::{BatchEvent, CancellationToken, Job, ProcessingConfig, Progress, ProgressState, RunSummary};
use crate::processing::BatchProcessor;
use crate::worker::{WorkerError, WorkerResult};

/// Runs at most one [`Job`] at a time on tokio's blocking pool.
///
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct JobExecutor {
    slot: Arc<Semaphore>,
    config: ProcessingConfig,
}

impl JobExecutor {
    pub fn new(config: ProcessingConfig) -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            config,
        }
    }

    /// Whether a job currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// Starts `job` in the background.
    ///
    /// Fails with [`WorkerError::Busy`] while another job is running. The slot is
    /// released once the run has returned its summary.
    pub fn submit(&self, job: Job) -> WorkerResult<JobHandle> {
        let permit = Arc::clone(&self.slot).try_acquire_owned()?;

        let processor = BatchProcessor::new(self.config.clone());
        let progress = processor.progress();
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();
        let (tx, events) = mpsc::unbounded_channel();

        info!(
            "Starting batch run in {} (budget {} bytes)",
            job.source_directory.display(),
            job.budget.bytes()
        );

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let summary = processor.run(&job, &worker_cancel, |event| {
                // A front end that stopped listening must not stop the run.
                let _ = tx.send(event);
            });
            debug!("Batch worker finished, releasing slot");
            summary
        });

        Ok(JobHandle { cancel, progress, events, task })
    }
}

/// Handle to a running (or finished) job.
pub struct JobHandle {
    cancel: CancellationToken,
    progress: Arc<ProgressState>,
    events: mpsc::UnboundedReceiver<BatchEvent>,
    task: JoinHandle<RunSummary>,
}

impl JobHandle {
    /// Requests a stop at the next item boundary. No-op once the run is over.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!("Stop requested");
            self.cancel.cancel();
        }
    }

    /// Token that cancels this job, for callers that also hold the event stream.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current progress; back at zero after the run completes.
    pub fn progress(&self) -> Progress {
        self.progress.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Next event of the run, in emission order. `None` after the last event.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Waits for the run to end and returns its summary.
    pub async fn join(self) -> WorkerResult<RunSummary> {
        self.task.await.map_err(WorkerError::from)
    }
}
