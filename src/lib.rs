// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod processing;
pub mod worker;
pub mod commands;

// Public exports for external consumers
pub use core::{
    BatchEvent, CancellationToken, ImageTask, ItemReport, ItemStatus, Job, LogLevel,
    ProcessingConfig, Progress, ProgressState, RunOutcome, RunSummary, SizeBudget,
};
pub use processing::{normalize, BatchProcessor, ReencodeOutcome, Reencoder};
pub use utils::{DownsizerError, DownsizerResult};
pub use worker::{JobExecutor, JobHandle, WorkerError};
pub use commands::*;
