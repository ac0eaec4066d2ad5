//! In-process codec for the static formats.
//!
//! Crop and resize run entirely through the `image` crate: `crop_imm`
//! for extraction, `resize_exact` with Lanczos3 for the final banner
//! dimensions, then re-encode in the source's own encoding family so a
//! PNG round-trips as PNG and a JPEG as JPEG.

use super::backend::{BackendError, CropRect, Dimensions};
use super::format::SourceFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Pure-Rust codec for PNG and JPEG sources.
pub struct RasterCodec {
    quality: Quality,
}

impl RasterCodec {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }

    /// Decoded dimensions of a buffer, without a full pixel decode.
    pub fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    /// Extract `rect` and resize to exactly `target`.
    pub fn crop(
        &self,
        source: &[u8],
        rect: CropRect,
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let img = load_image(source)?;
        let cropped = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
        let resized = cropped.resize_exact(target.width, target.height, FilterType::Lanczos3);
        self.encode(&resized, format)
    }

    /// Resize to exactly `target` without cropping.
    pub fn resize(
        &self,
        source: &[u8],
        target: Dimensions,
        format: SourceFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let img = load_image(source)?;
        let resized = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
        self.encode(&resized, format)
    }

    fn encode(&self, img: &DynamicImage, format: SourceFormat) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        match format {
            SourceFormat::Png => img
                .write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
                .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?,
            SourceFormat::Jpeg => {
                // JPEG has no alpha channel; flatten before encoding.
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(
                    Cursor::new(&mut out),
                    self.quality.value() as u8,
                ))
                .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?
            }
            SourceFormat::Gif => {
                return Err(BackendError::Encode(
                    "animated sources are not raster-encoded".to_string(),
                ));
            }
        }
        Ok(out)
    }
}

impl Default for RasterCodec {
    fn default() -> Self {
        Self::new(Quality::default())
    }
}

/// Decode a buffer into pixels. For a GIF this yields the first frame.
pub(crate) fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(source).map_err(|e| BackendError::Decode(format!("decode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn identify_png_dimensions() {
        let codec = RasterCodec::default();
        let dims = codec.identify(&png_bytes(320, 200)).unwrap();
        assert_eq!((dims.width, dims.height), (320, 200));
    }

    #[test]
    fn identify_garbage_errors() {
        let codec = RasterCodec::default();
        assert!(codec.identify(b"definitely not pixels").is_err());
    }

    #[test]
    fn crop_png_yields_exact_target_in_png() {
        let codec = RasterCodec::default();
        let rect = CropRect { x: 10, y: 20, width: 200, height: 100 };
        let target = Dimensions { width: 734, height: 293 };
        let out = codec
            .crop(&png_bytes(400, 300), rect, target, SourceFormat::Png)
            .unwrap();

        assert_eq!(SourceFormat::detect(&out), Some(SourceFormat::Png));
        let dims = codec.identify(&out).unwrap();
        assert_eq!((dims.width, dims.height), (734, 293));
    }

    #[test]
    fn crop_jpeg_stays_in_jpeg_family() {
        let codec = RasterCodec::default();
        let rect = CropRect { x: 0, y: 0, width: 100, height: 50 };
        let target = Dimensions { width: 200, height: 100 };
        let out = codec
            .crop(&jpeg_bytes(300, 200), rect, target, SourceFormat::Jpeg)
            .unwrap();
        assert_eq!(SourceFormat::detect(&out), Some(SourceFormat::Jpeg));
    }

    #[test]
    fn resize_upscales_small_source() {
        let codec = RasterCodec::default();
        let target = Dimensions { width: 734, height: 551 };
        let out = codec
            .resize(&png_bytes(400, 300), target, SourceFormat::Png)
            .unwrap();
        let dims = codec.identify(&out).unwrap();
        assert_eq!((dims.width, dims.height), (734, 551));
    }

    #[test]
    fn encode_refuses_animated_family() {
        let codec = RasterCodec::default();
        let rect = CropRect { x: 0, y: 0, width: 10, height: 10 };
        let target = Dimensions { width: 5, height: 5 };
        let result = codec.crop(&png_bytes(20, 20), rect, target, SourceFormat::Gif);
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
