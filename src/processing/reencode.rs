//! Size-bounded re-encoding.
//!
//! An image over budget is written at quality 85 and re-written 5 points lower until
//! it fits or quality reaches 10. Hitting the floor is not an error: the floor-quality
//! file is kept and reported as over budget. Images already within budget are copied
//! into the output directory byte for byte without ever entering the loop.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageReader};
use serde::Serialize;
use tracing::debug;

use crate::core::{display_name, ProcessingConfig};
use crate::utils::{
    derive_output_path, get_file_size, kind_from_extension, DownsizerError, DownsizerResult,
    ImageKind, OutputDir,
};

/// Writes a decoded image to disk at a given quality.
pub trait QualityEncoder {
    /// Encodes `image` as `kind` into `output`, replacing any existing file, and
    /// returns the size of the written file in bytes.
    ///
    /// Kinds without quality control ignore `quality`.
    fn encode(
        &self,
        image: &DynamicImage,
        kind: ImageKind,
        quality: u8,
        output: &Path,
    ) -> DownsizerResult<u64>;
}

/// Production encoder backed by the `image` crate codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateEncoder;

impl QualityEncoder for ImageCrateEncoder {
    fn encode(
        &self,
        image: &DynamicImage,
        kind: ImageKind,
        quality: u8,
        output: &Path,
    ) -> DownsizerResult<u64> {
        match kind {
            ImageKind::JPEG => save_jpeg(image, quality, output)?,
            other => {
                let format = other.codec().ok_or_else(|| DownsizerError::encode(
                    output,
                    format!("no encoder for {other:?}"),
                ))?;
                image
                    .save_with_format(output, format)
                    .map_err(|e| DownsizerError::encode(output, e))?;
            }
        }

        get_file_size(output).map_err(|e| DownsizerError::encode(output, e))
    }
}

/// Saves `image` as a baseline JPEG at `quality`, dropping any alpha channel.
fn save_jpeg(image: &DynamicImage, quality: u8, output: &Path) -> DownsizerResult<()> {
    let file = File::create(output).map_err(|e| DownsizerError::encode(output, e))?;
    let mut writer = BufWriter::new(file);

    {
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        let result = match image {
            DynamicImage::ImageLuma8(gray) => encoder.encode(
                gray.as_raw(),
                gray.width(),
                gray.height(),
                ExtendedColorType::L8,
            ),
            other => {
                let rgb = other.to_rgb8();
                encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            }
        };
        result.map_err(|e| DownsizerError::encode(output, e))?;
    }

    writer.flush().map_err(|e| DownsizerError::encode(output, e))
}

/// One write of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeAttempt {
    pub quality: u8,
    pub resulting_size_bytes: u64,
}

/// Result of running one file through the re-encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReencodeOutcome {
    /// The source already fit; its bytes were copied to `output_path` unchanged.
    NotDowngraded { output_path: PathBuf, size: u64 },
    /// The source was re-encoded into `output_path`.
    Downgraded {
        output_path: PathBuf,
        original_size: u64,
        /// The attempt whose file remains on disk
        last: EncodeAttempt,
        attempts: usize,
        within_budget: bool,
        /// False for lossless kinds, which are written once at format defaults
        quality_controlled: bool,
    },
}

impl ReencodeOutcome {
    pub fn output_path(&self) -> &Path {
        match self {
            Self::NotDowngraded { output_path, .. } | Self::Downgraded { output_path, .. } => {
                output_path
            }
        }
    }
}

/// Compresses single files down to a byte budget.
#[derive(Debug, Clone)]
pub struct Reencoder<E = ImageCrateEncoder> {
    encoder: E,
    config: ProcessingConfig,
}

impl Reencoder<ImageCrateEncoder> {
    pub fn new(config: ProcessingConfig) -> Self {
        Self::with_encoder(ImageCrateEncoder, config)
    }
}

impl<E: QualityEncoder> Reencoder<E> {
    pub fn with_encoder(encoder: E, config: ProcessingConfig) -> Self {
        Self { encoder, config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Brings `path` to at most `max_bytes` inside `output_dir`.
    ///
    /// The source is fully decoded first so a corrupt file fails here even when it is
    /// small enough to be copied. The output directory is created just before the
    /// first write.
    pub fn reencode(
        &self,
        path: &Path,
        max_bytes: u64,
        output_dir: &mut OutputDir,
    ) -> DownsizerResult<ReencodeOutcome> {
        let (image, kind) = decode(path)?;
        let original_size = get_file_size(path)?;
        let output_path = derive_output_path(path, output_dir.path(), &self.config.output_suffix);

        if original_size <= max_bytes {
            output_dir.prepare()?;
            std::fs::copy(path, &output_path)
                .map_err(|e| DownsizerError::encode(&output_path, e))?;

            debug!(
                "'{}' is {} bytes, within the {} byte budget; copied as is",
                display_name(path), original_size, max_bytes
            );
            return Ok(ReencodeOutcome::NotDowngraded { output_path, size: original_size });
        }

        output_dir.prepare()?;

        let floor = self.config.min_quality;
        let step = self.config.quality_step.max(1);
        let quality_controlled = kind.supports_quality();

        let mut quality = self.config.start_quality.max(floor);
        let mut size = self.encoder.encode(&image, kind, quality, &output_path)?;
        let mut attempts = 1;
        debug!("'{}' q{} -> {} bytes", display_name(&output_path), quality, size);

        // Lossless kinds would produce the same bytes every time.
        while quality_controlled && size > max_bytes && quality > floor {
            quality = quality.saturating_sub(step).max(floor);
            size = self.encoder.encode(&image, kind, quality, &output_path)?;
            attempts += 1;
            debug!("'{}' q{} -> {} bytes", display_name(&output_path), quality, size);
        }

        Ok(ReencodeOutcome::Downgraded {
            output_path,
            original_size,
            last: EncodeAttempt { quality, resulting_size_bytes: size },
            attempts,
            within_budget: size <= max_bytes,
            quality_controlled,
        })
    }
}

/// Opens and decodes `path`, returning the image and the kind to write it back as.
///
/// The kind comes from the file contents, falling back to the extension.
fn decode(path: &Path) -> DownsizerResult<(DynamicImage, ImageKind)> {
    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| DownsizerError::decode(path, e))?;

    let kind = reader
        .format()
        .and_then(ImageKind::from_codec)
        .or_else(|| kind_from_extension(path).ok())
        .filter(|kind| !kind.is_layered())
        .ok_or_else(|| DownsizerError::decode(path, "unrecognized image format"))?;

    let image = reader.decode().map_err(|e| DownsizerError::decode(path, e))?;
    Ok((image, kind))
}
