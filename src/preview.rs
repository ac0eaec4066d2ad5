//! Crop preview rendering.
//!
//! Produces a single static PNG of the source with the crop rectangle
//! highlighted: everything outside the rectangle is dimmed, the
//! rectangle gets an outline, and a bitmap-text label carries the
//! region geometry and zoom percentage. Animated sources are previewed
//! as their first frame — preview fidelity for animation is a
//! deliberate simplification.
//!
//! Preview generation never surfaces a hard failure. Any render error
//! falls back to a synthetic diagram with the same numbers in text
//! form.

use crate::config::Config;
use crate::geometry;
use crate::media::BackendError;
use crate::media::raster::load_image;
use crate::session::Session;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use tracing::warn;

const OUTLINE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const LABEL_SHADOW: Rgba<u8> = Rgba([0, 0, 0, 255]);
const FALLBACK_BG: Rgba<u8> = Rgba([24, 24, 28, 255]);

/// Render the preview for a session. Infallible from the caller's
/// perspective.
pub fn render(session: &Session, config: &Config) -> Vec<u8> {
    match render_overlay(session, config) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, "preview render failed, using fallback diagram");
            fallback_diagram(session, config)
        }
    }
}

fn render_overlay(session: &Session, config: &Config) -> Result<Vec<u8>, BackendError> {
    let source = (session.size.width, session.size.height);
    let (rx, ry, rw, rh) = geometry::crop_rect(session.region, source, config.banner());

    let mut canvas = load_image(&session.source)?.to_rgba8();

    // Downscale wide sources for display; the label keeps true
    // source-space numbers.
    let scale = if session.size.width > config.preview_max_width {
        config.preview_max_width as f64 / session.size.width as f64
    } else {
        1.0
    };
    if scale < 1.0 {
        let w = config.preview_max_width;
        let h = ((session.size.height as f64 * scale).round() as u32).max(1);
        canvas = image::imageops::resize(&canvas, w, h, FilterType::Triangle);
    }
    let at = |v: u32| (v as f64 * scale).round() as u32;

    dim_outside(&mut canvas, at(rx), at(ry), at(rw).max(1), at(rh).max(1));
    draw_rect_outline(&mut canvas, at(rx), at(ry), at(rw).max(1), at(rh).max(1));

    let label = format!(
        "{rw}x{rh} @ {}%  offset {rx},{ry}",
        zoom_percent(session.region.zoom)
    );
    draw_text(&mut canvas, 9, 9, &label, LABEL_SHADOW, 2);
    draw_text(&mut canvas, 8, 8, &label, LABEL, 2);

    encode_png(&canvas)
}

/// Minimal synthetic diagram carrying the same numbers as text. Used
/// whenever the real render fails for any reason.
fn fallback_diagram(session: &Session, config: &Config) -> Vec<u8> {
    let source = (session.size.width, session.size.height);
    let (rx, ry, rw, rh) = geometry::crop_rect(session.region, source, config.banner());

    let mut canvas = RgbaImage::from_pixel(480, 180, FALLBACK_BG);
    let lines = [
        "preview unavailable".to_string(),
        format!("source {}x{} {}", session.size.width, session.size.height, session.format),
        format!("crop {rx},{ry} {rw}x{rh}"),
        format!("zoom {}%", zoom_percent(session.region.zoom)),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(&mut canvas, 12, 12 + i as i32 * 28, line, LABEL, 2);
    }

    encode_png(&canvas).unwrap_or_default()
}

fn zoom_percent(zoom: f32) -> u32 {
    (zoom as f64 * 100.0).round() as u32
}

/// Halve the brightness of every pixel outside the crop rectangle.
fn dim_outside(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    for (px, py, pixel) in img.enumerate_pixels_mut() {
        let inside = px >= x && px < x.saturating_add(w) && py >= y && py < y.saturating_add(h);
        if !inside {
            let [r, g, b, a] = pixel.0;
            *pixel = Rgba([r / 2, g / 2, b / 2, a]);
        }
    }
}

/// Two-pixel outline just inside the rectangle, clipped to the canvas.
fn draw_rect_outline(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    let (iw, ih) = img.dimensions();
    let put = |img: &mut RgbaImage, px: u32, py: u32| {
        if px < iw && py < ih {
            img.put_pixel(px, py, OUTLINE);
        }
    };
    for t in 0..2u32 {
        let x1 = x + t;
        let y1 = y + t;
        let x2 = (x + w).saturating_sub(t + 1);
        let y2 = (y + h).saturating_sub(t + 1);
        if x1 > x2 || y1 > y2 {
            continue;
        }
        for px in x1..=x2 {
            put(img, px, y1);
            put(img, px, y2);
        }
        for py in y1..=y2 {
            put(img, x1, py);
            put(img, x2, py);
        }
    }
}

/// 8x8 bitmap glyphs scaled up, clipped to the canvas.
fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let (iw, ih) = img.dimensions();
    let mut cx = x;
    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..8u32 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = cx + (col * scale + dx) as i32;
                            let py = y + (row as u32 * scale + dy) as i32;
                            if px >= 0 && py >= 0 && (px as u32) < iw && (py as u32) < ih {
                                img.put_pixel(px as u32, py as u32, color);
                            }
                        }
                    }
                }
            }
        }
        cx += (8 * scale) as i32;
    }
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    img.write_with_encoder(PngEncoder::new(Cursor::new(&mut out)))
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {e}")))?;
    Ok(out)
}
