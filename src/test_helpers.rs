//! Shared test utilities: synthetic in-memory image fixtures.
//!
//! Every builder returns encoded bytes, not pixels — the code under
//! test always starts from what a caller would actually submit.

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Delay, Frame, ImageEncoder, RgbImage, RgbaImage};
use std::io::Cursor;

/// A small PNG with a deterministic gradient fill.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    PngEncoder::new(Cursor::new(&mut out))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A small JPEG with the same gradient fill.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    JpegEncoder::new(Cursor::new(&mut out))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// A GIF with `frames` frames of `delay_ms` each, looping forever.
///
/// `delay_ms = 0` produces the degenerate shape the animated processor
/// treats as a suspected single-frame collapse.
pub fn gif_bytes(width: u32, height: u32, frames: u32, delay_ms: u32) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        for i in 0..frames {
            let shade = (i * 60 % 256) as u8;
            let buf = RgbaImage::from_fn(width, height, |x, _| {
                image::Rgba([shade, (x % 256) as u8, 200, 255])
            });
            let frame = Frame::from_parts(buf, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder.encode_frame(frame).unwrap();
        }
    }
    out
}
