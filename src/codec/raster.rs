//! Codec backed by the `image` crate.
//!
//! # Design Decisions
//!
//! - **Content sniffing**: the format is guessed from the file's magic bytes,
//!   never from the client-supplied filename.
//!
//! - **Same container out**: resized images are written in the format they
//!   were uploaded in.
//!
//! - **Quality control**: JPEG output uses a configurable quality; the other
//!   encoders run with their defaults.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};

use super::{ImageCodec, ImageKind, ImageMetadata};
use crate::error::DepotError;
use crate::resize::ResizeDecision;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Raster Codec
// =============================================================================

/// [`ImageCodec`] implementation on top of the `image` crate.
#[derive(Debug, Clone)]
pub struct RasterCodec {
    jpeg_quality: u8,
    filter: FilterType,
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl RasterCodec {
    /// Create a codec that writes JPEG output at `jpeg_quality` (clamped to 1-100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: clamp_quality(jpeg_quality),
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    fn open(path: &Path) -> Result<ImageReader<std::io::BufReader<File>>, DepotError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        if reader.format().is_none() {
            return Err(DepotError::Decode {
                message: "unrecognised image data".to_string(),
            });
        }
        Ok(reader)
    }

    fn encode(&self, img: DynamicImage, kind: ImageKind, target: &Path) -> Result<(), DepotError> {
        let mut writer = BufWriter::new(File::create(target)?);

        match kind {
            ImageKind::Jpeg => {
                // JPEG has no alpha channel
                let img = if img.color().has_alpha() {
                    DynamicImage::ImageRgb8(img.to_rgb8())
                } else {
                    img
                };
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality);
                img.write_with_encoder(encoder)?;
            }
            other => img.write_to(&mut writer, other.format())?,
        }

        writer.flush()?;
        Ok(())
    }
}

impl ImageCodec for RasterCodec {
    fn metadata(&self, path: &Path) -> Result<ImageMetadata, DepotError> {
        let reader = Self::open(path)?;
        let format = reader.format().ok_or_else(|| DepotError::Decode {
            message: "unrecognised image data".to_string(),
        })?;
        let kind = ImageKind::from_format(format).ok_or_else(|| DepotError::UnsupportedFormat {
            format: format!("{:?}", format),
        })?;

        let (width, height) = reader.into_dimensions().map_err(decode_failure)?;
        if width == 0 || height == 0 {
            return Err(DepotError::Decode {
                message: format!("image has zero dimensions ({}x{})", width, height),
            });
        }

        Ok(ImageMetadata {
            width,
            height,
            format: kind,
        })
    }

    fn resize(
        &self,
        source: &Path,
        target: &Path,
        kind: ImageKind,
        decision: ResizeDecision,
    ) -> Result<(), DepotError> {
        let img = Self::open(source)?.decode().map_err(decode_failure)?;
        let resized = img.resize_exact(decision.width, decision.height, self.filter);
        self.encode(resized, kind, target)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Classify an error raised while reading pixel data.
///
/// The staged file is already on local disk, so an I/O error here means the
/// upload itself is truncated or malformed.
fn decode_failure(err: ImageError) -> DepotError {
    match err {
        ImageError::Unsupported(e) => DepotError::UnsupportedFormat {
            format: e.to_string(),
        },
        other => DepotError::Decode {
            message: other.to_string(),
        },
    }
}

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
