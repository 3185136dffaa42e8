//! Core types for batch runs: the job, its budget, and what a run reports back.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::utils::{DownsizerError, DownsizerResult};

/// Bytes in one user-facing megabyte. Applied exactly once, when a budget is built.
pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Largest budget accepted from the user, in megabytes.
pub const MAX_BUDGET_MEGABYTES: i64 = 10_000;

/// Maximum acceptable output size for one image, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeBudget(u64);

impl SizeBudget {
    /// Builds a budget from whole megabytes as typed by the user.
    ///
    /// Rejects non-positive values and anything above [`MAX_BUDGET_MEGABYTES`].
    pub fn from_megabytes(megabytes: i64) -> DownsizerResult<Self> {
        if megabytes <= 0 {
            return Err(DownsizerError::invalid_input(format!(
                "Size budget must be a positive number of megabytes, got {megabytes}"
            )));
        }
        if megabytes > MAX_BUDGET_MEGABYTES {
            return Err(DownsizerError::invalid_input(format!(
                "Size budget must be at most {MAX_BUDGET_MEGABYTES} MB, got {megabytes}"
            )));
        }

        Ok(Self(megabytes as u64 * BYTES_PER_MEGABYTE))
    }

    /// Builds a budget from an exact byte count.
    pub fn from_bytes(bytes: u64) -> DownsizerResult<Self> {
        if bytes == 0 {
            return Err(DownsizerError::invalid_input("Size budget cannot be 0 bytes"));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

/// One user-initiated pass over a directory. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub source_directory: PathBuf,
    pub budget: SizeBudget,
}

impl Job {
    pub fn new(source_directory: impl Into<PathBuf>, budget: SizeBudget) -> Self {
        Self {
            source_directory: source_directory.into(),
            budget,
        }
    }

    /// Where re-encoded files for this job land.
    pub fn output_directory(&self, config: &ProcessingConfig) -> PathBuf {
        self.source_directory.join(&config.output_dir_name)
    }
}

/// Fixed processing parameters. The defaults are the tool's documented behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Name of the output sub-directory created inside the source directory
    pub output_dir_name: String,
    /// Inserted between the file stem and the extension of every output file
    pub output_suffix: String,
    /// Quality of the first encode attempt
    pub start_quality: u8,
    /// Quality never drops below this
    pub min_quality: u8,
    /// Amount quality drops between attempts
    pub quality_step: u8,
    /// Extension of the sibling file written when flattening a layered image
    pub flatten_extension: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            output_dir_name: "downsized".to_string(),
            output_suffix: "_downgraded".to_string(),
            start_quality: 85,
            min_quality: 10,
            quality_step: 5,
            flatten_extension: "png".to_string(),
        }
    }
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum ItemStatus {
    /// Already within budget; copied unmodified into the output directory
    NotDowngraded { output_path: PathBuf, size: u64 },
    /// Re-encoded. `within_budget` is false when the quality floor was hit first.
    Downgraded {
        output_path: PathBuf,
        quality: Option<u8>,
        attempts: usize,
        original_size: u64,
        size: u64,
        within_budget: bool,
    },
    Failed { error: String },
}

/// Per-file record kept by the batch driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub original_path: PathBuf,
    pub working_path: PathBuf,
    pub normalized: bool,
    pub status: ItemStatus,
}

impl ItemReport {
    pub fn is_success(&self) -> bool {
        !matches!(self.status, ItemStatus::Failed { .. })
    }
}

/// How a run ended, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RunOutcome {
    AllSucceeded,
    SomeFailed { failed: usize },
    NothingToProcess,
    StoppedByUser,
}

/// Final report of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Files that matched the allow-list
    pub total: usize,
    pub items: Vec<ItemReport>,
}

impl RunSummary {
    pub fn nothing_to_process() -> Self {
        Self {
            outcome: RunOutcome::NothingToProcess,
            total: 0,
            items: Vec::new(),
        }
    }

    /// Settles the outcome from the collected reports.
    pub fn from_items(total: usize, items: Vec<ItemReport>, stopped: bool) -> Self {
        let failed = items.iter().filter(|item| !item.is_success()).count();
        let outcome = if stopped {
            RunOutcome::StoppedByUser
        } else if failed > 0 {
            RunOutcome::SomeFailed { failed }
        } else {
            RunOutcome::AllSucceeded
        };

        Self { outcome, total, items }
    }

    pub fn processed(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }

    /// One-line message for the completion notification.
    pub fn message(&self) -> String {
        match self.outcome {
            RunOutcome::AllSucceeded => format!("Images processed successfully ({} files)", self.processed()),
            RunOutcome::SomeFailed { failed } => format!(
                "Images processed with {failed} failure(s) out of {}", self.processed()
            ),
            RunOutcome::NothingToProcess => "No images found to process.".to_string(),
            RunOutcome::StoppedByUser => format!(
                "Process stopped by user after {} of {} files", self.processed(), self.total
            ),
        }
    }
}
