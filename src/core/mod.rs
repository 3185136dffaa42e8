//! Core application types.
//!
//! This module contains the fundamental types used throughout the application:
//! - [`Job`]: One batch run over a directory with a [`SizeBudget`]
//! - [`ImageTask`]: Represents one discovered image
//! - [`ProgressState`]: Progress tracking for batch operations
//! - [`CancellationToken`]: Cooperative stop request
//! - [`RunSummary`]: Result of a batch run

mod cancel;
mod progress;
mod task;
mod types;

pub use cancel::CancellationToken;
pub use progress::{BatchEvent, LogLevel, Progress, ProgressState};
pub use task::{display_name, ImageTask};
pub use types::{
    ItemReport, ItemStatus, Job, ProcessingConfig, RunOutcome, RunSummary, SizeBudget,
    BYTES_PER_MEGABYTE, MAX_BUDGET_MEGABYTES,
};
