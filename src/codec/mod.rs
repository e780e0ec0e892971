//! Image codec layer.
//!
//! The ingestion pipeline never touches pixels itself. It asks an
//! [`ImageCodec`] for the metadata of a staged file and, when the resize
//! policy shrinks the image, asks it to write the resized copy.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │       Ingestion Pipeline     │
//! └──────────────┬───────────────┘
//!                │ metadata() / resize()
//!                ▼
//! ┌──────────────────────────────┐
//! │      ImageCodec trait        │
//! └──────────────┬───────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │  RasterCodec (image crate)   │
//! └──────────────────────────────┘
//! ```
//!
//! Codec calls are blocking; the pipeline runs them on tokio's blocking pool.

mod raster;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::DepotError;
use crate::resize::ResizeDecision;

pub use raster::{clamp_quality, is_valid_quality, RasterCodec, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY};

// =============================================================================
// Image Kind
// =============================================================================

/// Container formats the service accepts and stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
    Tiff,
    Bmp,
}

impl ImageKind {
    /// Canonical file extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
            ImageKind::Gif => "gif",
            ImageKind::Tiff => "tiff",
            ImageKind::Bmp => "bmp",
        }
    }

    /// Map a decoder format onto a stored kind.
    ///
    /// Returns `None` for formats the decoder can read but this service does not store.
    pub fn from_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            image::ImageFormat::Png => Some(ImageKind::Png),
            image::ImageFormat::WebP => Some(ImageKind::Webp),
            image::ImageFormat::Gif => Some(ImageKind::Gif),
            image::ImageFormat::Tiff => Some(ImageKind::Tiff),
            image::ImageFormat::Bmp => Some(ImageKind::Bmp),
            _ => None,
        }
    }

    /// The decoder format used to write this kind.
    pub fn format(&self) -> image::ImageFormat {
        match self {
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
            ImageKind::Png => image::ImageFormat::Png,
            ImageKind::Webp => image::ImageFormat::WebP,
            ImageKind::Gif => image::ImageFormat::Gif,
            ImageKind::Tiff => image::ImageFormat::Tiff,
            ImageKind::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// =============================================================================
// Image Metadata
// =============================================================================

/// Dimensions and format of a decoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    /// Width in pixels (always > 0)
    pub width: u32,

    /// Height in pixels (always > 0)
    pub height: u32,

    /// Container format reported by the decoder
    pub format: ImageKind,
}

// =============================================================================
// Codec Trait
// =============================================================================

/// Decoder collaborator used by the ingestion pipeline.
///
/// Implementations must reject zero-sized images from [`ImageCodec::metadata`].
pub trait ImageCodec: Send + Sync + 'static {
    /// Read dimensions and format from the file at `path`.
    fn metadata(&self, path: &Path) -> Result<ImageMetadata, DepotError>;

    /// Decode `source`, resample it to `decision`, and write it to `target` as `kind`.
    ///
    /// The pipeline reserves `target` in the store first; implementations
    /// overwrite that empty file.
    fn resize(
        &self,
        source: &Path,
        target: &Path,
        kind: ImageKind,
        decision: ResizeDecision,
    ) -> Result<(), DepotError>;
}
