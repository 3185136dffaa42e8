use std::fs;
use std::path::{Path, PathBuf};
use crate::utils::{is_supported, DownsizerError, DownsizerResult};

/// Get file size in bytes
pub fn get_file_size(path: impl AsRef<Path>) -> DownsizerResult<u64> {
    fs::metadata(path.as_ref())
        .map(|m| m.len())
        .map_err(|e| DownsizerError::io(format!(
            "Failed to get file size of {}: {}", path.as_ref().display(), e
        )))
}

/// Lists the supported images directly inside `dir`, sorted by file name.
///
/// Sub-directories (including a previous run's output directory) are not descended into.
pub fn list_images(dir: impl AsRef<Path>) -> DownsizerResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| DownsizerError::io(format!(
        "Failed to read directory {}: {}", dir.display(), e
    )))?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| is_supported(path))
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Derives `<output_dir>/<stem><suffix>.<ext>` from `working_path`.
///
/// Only the last extension is split off, so `a.b.jpg` becomes `a.b_downgraded.jpg`.
pub fn derive_output_path(working_path: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = working_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match working_path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };

    output_dir.join(file_name)
}

/// Returns `path` with its extension swapped for `ext`, kept in the same directory.
pub fn sibling_with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Creates `dir` if missing. Returns `true` when this call created it.
pub fn ensure_dir(dir: impl AsRef<Path>) -> DownsizerResult<bool> {
    let dir = dir.as_ref();
    if dir.is_dir() {
        return Ok(false);
    }

    fs::create_dir_all(dir).map_err(|e| DownsizerError::io(format!(
        "Cannot create output directory {}: {}", dir.display(), e
    )))?;
    Ok(true)
}

/// Output directory that is only created right before the first write into it.
#[derive(Debug, Clone)]
pub struct OutputDir {
    path: PathBuf,
    ready: bool,
}

impl OutputDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ready: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes sure the directory exists. Returns `true` only on the call that created it.
    pub fn prepare(&mut self) -> DownsizerResult<bool> {
        if self.ready {
            return Ok(false);
        }

        let created = ensure_dir(&self.path)?;
        self.ready = true;
        Ok(created)
    }
}
