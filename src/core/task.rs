//! Image task definition.

use std::path::{Path, PathBuf};
use serde::Serialize;

/// One discovered file, tracked through normalization and re-encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTask {
    /// File as found in the source directory
    pub original_path: PathBuf,
    /// File that downstream steps operate on
    pub working_path: PathBuf,
    /// Whether `working_path` was produced by flattening `original_path`
    pub normalized: bool,
}

impl ImageTask {
    pub fn new(original_path: impl Into<PathBuf>) -> Self {
        let original_path = original_path.into();
        Self {
            working_path: original_path.clone(),
            original_path,
            normalized: false,
        }
    }

    /// Points all later steps at `flattened`, unless it is the original file.
    pub fn set_working_path(&mut self, flattened: PathBuf) {
        self.normalized = flattened != self.original_path;
        self.working_path = flattened;
    }

    pub fn file_name(&self) -> String {
        display_name(&self.original_path)
    }
}

/// Extracts the file name for log lines, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
