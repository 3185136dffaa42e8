//! Start/stop handlers shared by every front end.

use std::path::PathBuf;
use tracing::debug;
use crate::core::{Job, SizeBudget};
use crate::utils::{DownsizerError, DownsizerResult};
use crate::worker::{JobExecutor, JobHandle, WorkerError};

/// Starts a batch run over `folder` with a budget of `budget_mb` megabytes per image.
///
/// `None` stands for a dialog the user dismissed. A missing folder, a folder that is
/// not a directory, or a budget outside `1..=10000` is rejected with
/// [`DownsizerError::InvalidInput`] and no job is created.
///
/// # Returns
/// A handle to observe and stop the run, or [`WorkerError::Busy`] if a run is
/// already active.
pub fn start_downsizing(
    executor: &JobExecutor,
    folder: Option<PathBuf>,
    budget_mb: Option<i64>,
) -> Result<JobHandle, WorkerError> {
    let job = build_job(folder, budget_mb)?;
    debug!("Received start command for {}", job.source_directory.display());
    executor.submit(job)
}

/// Validates the raw user input into a [`Job`].
pub fn build_job(folder: Option<PathBuf>, budget_mb: Option<i64>) -> DownsizerResult<Job> {
    let folder = folder.ok_or_else(|| DownsizerError::invalid_input("No folder selected"))?;
    if !folder.is_dir() {
        return Err(DownsizerError::invalid_input(format!(
            "Not a directory: {}", folder.display()
        )));
    }

    let budget_mb = budget_mb.ok_or_else(|| DownsizerError::invalid_input("No size budget given"))?;
    let budget = SizeBudget::from_megabytes(budget_mb)?;

    Ok(Job::new(folder, budget))
}

/// Requests cancellation of the active run. No-op without one.
pub fn stop_processing(handle: Option<&JobHandle>) {
    match handle {
        Some(handle) => handle.cancel(),
        None => debug!("Stop requested with no active run"),
    }
}
