//! Flattens layered composites into a plain raster the re-encoder can handle.

use std::panic;
use std::path::{Path, PathBuf};
use image::RgbaImage;
use psd::Psd;
use tracing::debug;

use crate::core::display_name;
use crate::utils::{kind_from_extension, sibling_with_extension, DownsizerError, DownsizerResult};

/// Returns the path downstream steps should use for `path`.
///
/// Flat formats come back unchanged and nothing is written. A PSD is composed into a
/// single RGBA raster and saved next to the original as `<base>.<flatten_ext>`; the
/// PSD itself is left alone.
pub fn normalize(path: &Path, flatten_ext: &str) -> DownsizerResult<PathBuf> {
    let kind = kind_from_extension(path)
        .map_err(|e| DownsizerError::normalization(path, e))?;

    if !kind.is_layered() {
        return Ok(path.to_path_buf());
    }

    let flattened = flatten_psd(path)?;
    let new_path = sibling_with_extension(path, flatten_ext);

    flattened
        .save(&new_path)
        .map_err(|e| DownsizerError::normalization(path, format!(
            "cannot write {}: {e}", new_path.display()
        )))?;

    debug!(
        "Flattened '{}' into '{}' ({}×{})",
        display_name(path),
        display_name(&new_path),
        flattened.width(),
        flattened.height()
    );

    Ok(new_path)
}

/// Where [`normalize`] will write the flattened raster for `path`, or `None` when
/// `path` is already flat.
pub fn flattened_path(path: &Path, flatten_ext: &str) -> Option<PathBuf> {
    kind_from_extension(path)
        .ok()
        .filter(|kind| kind.is_layered())
        .map(|_| sibling_with_extension(path, flatten_ext))
}

/// Composes every visible layer of the document at `path`.
fn flatten_psd(path: &Path) -> DownsizerResult<RgbaImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| DownsizerError::normalization(path, e))?;

    // The psd parser indexes its input without bounds checks and panics on some
    // truncated files; a bad document must only fail its own item.
    let composed = panic::catch_unwind(|| {
        Psd::from_bytes(&bytes).map(|psd| (psd.width(), psd.height(), psd.rgba()))
    })
    .map_err(|_| DownsizerError::normalization(path, "malformed PSD document"))?
    .map_err(|e| DownsizerError::normalization(path, e))?;

    let (width, height, rgba) = composed;
    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| DownsizerError::normalization(
            path,
            "composite pixel data does not match the document dimensions",
        ))
}
