//! Media processing — per-format codec strategies behind one trait.
//!
//! | Operation | Path |
//! |---|---|
//! | **Identify** | `image` crate dimension read |
//! | **Static crop/resize** | [`RasterCodec`] — `crop_imm` + Lanczos3, in process |
//! | **Animated crop/resize** | [`AnimatedProcessor`] — gifsicle, then ffmpeg |
//! | **Format sniffing** | [`SourceFormat::detect`] over magic bytes |
//!
//! The module is split into:
//! - **Format**: the closed supported set and content sniffing
//! - **Backend**: the [`MediaBackend`] trait the pipeline is generic over
//! - **Raster**: the in-process static codec
//! - **Animated**: the external-tool strategy chain

pub mod animated;
pub mod backend;
pub mod format;
pub mod raster;

pub use animated::{AnimatedError, AnimatedProcessor, GifTransform};
pub use backend::{BackendError, CropRect, Dimensions, MediaBackend};
pub use format::SourceFormat;
pub use raster::{Quality, RasterCodec};

/// Production backend: raster codec for the static formats, external
/// strategy chain for animated ones.
pub struct Toolkit {
    raster: RasterCodec,
    animated: AnimatedProcessor,
}

impl Toolkit {
    pub fn new(raster: RasterCodec, animated: AnimatedProcessor) -> Self {
        Self { raster, animated }
    }
}

impl MediaBackend for Toolkit {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        self.raster.identify(source)
    }

    fn crop_static(
        &self,
        source: &[u8],
        rect: CropRect,
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError> {
        self.raster.crop(source, rect, target, format)
    }

    fn resize_static(
        &self,
        source: &[u8],
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError> {
        self.raster.resize(source, target, format)
    }

    fn crop_animated(
        &self,
        source: &[u8],
        rect: CropRect,
        target: Dimensions,
    ) -> Result<Vec<u8>, BackendError> {
        Ok(self
            .animated
            .transform(source, GifTransform::CropResize { rect, target })?)
    }

    fn resize_animated(&self, source: &[u8], target: Dimensions) -> Result<Vec<u8>, BackendError> {
        Ok(self
            .animated
            .transform(source, GifTransform::Resize { target })?)
    }
}
