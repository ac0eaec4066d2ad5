//! Media backend trait and shared types.
//!
//! [`MediaBackend`] is the seam between the crop pipeline (which decides
//! what to produce) and the codecs (which touch pixels and external
//! tools). The production implementation is [`Toolkit`](super::Toolkit),
//! combining the in-process [`RasterCodec`](super::raster::RasterCodec)
//! with the external-tool [`AnimatedProcessor`](super::animated::AnimatedProcessor).

use super::animated::AnimatedError;
use super::format::SourceFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Animated(#[from] AnimatedError),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Trait for media processing backends.
///
/// All operations are buffer-in/buffer-out; the pipeline owns every
/// buffer and the backend owns nothing between calls. `Sync` so sessions
/// can run their pipelines concurrently against one shared backend.
pub trait MediaBackend: Sync {
    /// Decoded dimensions of a source buffer.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Crop a static source to `rect`, resize to exactly `target`, and
    /// re-encode in the source's encoding family.
    fn crop_static(
        &self,
        source: &[u8],
        rect: CropRect,
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError>;

    /// Resize a static source to exactly `target` (pre-upscale path).
    fn resize_static(
        &self,
        source: &[u8],
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError>;

    /// Crop an animated source to `rect` and resize to exactly `target`,
    /// preserving frame timing and looping.
    fn crop_animated(
        &self,
        source: &[u8],
        rect: CropRect,
        target: Dimensions,
    ) -> Result<Vec<u8>, BackendError>;

    /// Resize an animated source to exactly `target`, preserving frame
    /// timing and looping (pre-upscale path).
    fn resize_animated(&self, source: &[u8], target: Dimensions) -> Result<Vec<u8>, BackendError>;
}
