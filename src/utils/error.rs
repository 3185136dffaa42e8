//! Error types for the image downsizer.
//!
//! Every failure that can happen while processing a single image is an item-scoped
//! [`DownsizerError`]; the batch driver records it and moves on to the next file.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use serde::Serialize;

/// Main error type for the downsizer.
///
/// Codec errors are flattened to strings so the error can be serialized and shipped
/// to whatever front end is listening to the event stream.
#[derive(Error, Debug, Serialize)]
pub enum DownsizerError {
    /// A layered composite could not be flattened
    #[error("Failed to flatten {}: {reason}", path.display())]
    Normalization { path: PathBuf, reason: String },

    /// A flat raster image could not be opened or decoded
    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// Writing the re-encoded output failed
    #[error("Failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },

    /// User supplied a missing or unusable value for a start action
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unsupported image format
    #[error("Format error: {0}")]
    Format(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),
}

/// Convenience result type for downsizer operations.
pub type DownsizerResult<T> = Result<T, DownsizerError>;

// Helper methods for error creation
impl DownsizerError {
    pub fn normalization(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Normalization {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }
}

// Convert std::io::Error to DownsizerError
impl From<io::Error> for DownsizerError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors_name_the_offending_file() {
        let err = DownsizerError::normalization("/photos/layered.psd", "bad header");
        assert_eq!(err.to_string(), "Failed to flatten /photos/layered.psd: bad header");

        let err = DownsizerError::encode("/photos/downsized/a_downgraded.jpg", "disk full");
        assert!(err.to_string().contains("a_downgraded.jpg"));
    }

    #[test]
    fn io_errors_convert() {
        let err: DownsizerError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DownsizerError::IO(ref msg) if msg == "gone"));
    }
}
