use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use crate::utils::DownsizerError;

/// Every image kind the downsizer picks up from a source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    JPEG,
    PNG,
    GIF,
    BMP,
    TIFF,
    /// Layered Photoshop document, flattened before re-encoding
    PSD,
}

impl ImageKind {
    pub const ALL: [ImageKind; 6] = [
        Self::JPEG,
        Self::PNG,
        Self::GIF,
        Self::BMP,
        Self::TIFF,
        Self::PSD,
    ];

    /// Get file extensions associated with this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::JPEG => &["jpg", "jpeg"],
            Self::PNG => &["png"],
            Self::GIF => &["gif"],
            Self::BMP => &["bmp"],
            Self::TIFF => &["tiff", "tif"],
            Self::PSD => &["psd"],
        }
    }

    /// Layered kinds must be flattened before they can be re-encoded
    pub fn is_layered(&self) -> bool {
        matches!(self, Self::PSD)
    }

    /// Whether the encoder honours a quality parameter for this kind.
    ///
    /// Everything but JPEG is written lossless, so lowering quality cannot shrink it.
    pub fn supports_quality(&self) -> bool {
        matches!(self, Self::JPEG)
    }

    /// Codec used to write this kind back out. PSD has no encoder.
    pub fn codec(&self) -> Option<image::ImageFormat> {
        match self {
            Self::JPEG => Some(image::ImageFormat::Jpeg),
            Self::PNG => Some(image::ImageFormat::Png),
            Self::GIF => Some(image::ImageFormat::Gif),
            Self::BMP => Some(image::ImageFormat::Bmp),
            Self::TIFF => Some(image::ImageFormat::Tiff),
            Self::PSD => None,
        }
    }

    /// Maps a sniffed codec back onto the allow-list
    pub fn from_codec(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::JPEG),
            image::ImageFormat::Png => Some(Self::PNG),
            image::ImageFormat::Gif => Some(Self::GIF),
            image::ImageFormat::Bmp => Some(Self::BMP),
            image::ImageFormat::Tiff => Some(Self::TIFF),
            _ => None,
        }
    }
}

impl FromStr for ImageKind {
    type Err = DownsizerError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&ext.as_str()))
            .ok_or_else(|| DownsizerError::format(format!(
                "Unsupported image format: {}", ext
            )))
    }
}

/// Get kind from file extension (case-insensitive)
pub fn kind_from_extension(path: impl AsRef<Path>) -> Result<ImageKind, DownsizerError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| DownsizerError::format(
            format!("File has no extension: {}", path.display())
        ))?;

    ImageKind::from_str(ext)
}

/// Whether a file name passes the extension allow-list
pub fn is_supported(path: impl AsRef<Path>) -> bool {
    kind_from_extension(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        assert_eq!(kind_from_extension("a/b/Photo.JPG").unwrap(), ImageKind::JPEG);
        assert_eq!(kind_from_extension("scan.Tif").unwrap(), ImageKind::TIFF);
        assert_eq!(kind_from_extension("art.PSD").unwrap(), ImageKind::PSD);
        assert!(is_supported("x.jpeg"));
        assert!(is_supported("x.gif"));
        assert!(is_supported("x.bmp"));
    }

    #[test]
    fn rejects_unlisted_and_extensionless_files() {
        assert!(!is_supported("notes.txt"));
        assert!(!is_supported("photo.webp"));
        assert!(!is_supported("README"));
        assert!(matches!(kind_from_extension("README"), Err(DownsizerError::Format(_))));
    }

    #[test]
    fn only_jpeg_is_quality_controlled() {
        for kind in ImageKind::ALL {
            assert_eq!(kind.supports_quality(), kind == ImageKind::JPEG);
        }
        assert!(ImageKind::PSD.is_layered());
        assert!(ImageKind::PSD.codec().is_none());
    }

    #[test]
    fn codec_mapping_round_trips_for_flat_kinds() {
        for kind in ImageKind::ALL.into_iter().filter(|k| !k.is_layered()) {
            let codec = kind.codec().unwrap();
            assert_eq!(ImageKind::from_codec(codec), Some(kind));
        }
    }
}
