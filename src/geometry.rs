//! Pure calculation functions for the crop region.
//!
//! Everything here is arithmetic over `(width, height)` tuples and the
//! [`CropRegion`] value — no I/O, no pixels. The invariant maintained by
//! every function that returns a region: the crop rectangle implied by
//! `(x, y, zoom)` never extends past the source bounds in either axis.

/// Lower bound of the zoom factor.
pub const ZOOM_MIN: f32 = 0.5;
/// Upper bound of the zoom factor.
pub const ZOOM_MAX: f32 = 3.0;

/// Current crop selection: top-left offset in source pixels plus zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub zoom: f32,
}

/// Direction of a single move command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Viewport dimensions at a given zoom: the banner size scaled by `zoom`,
/// rounded to whole pixels.
///
/// # Examples
/// ```
/// # use bannercut::geometry::effective_size;
/// assert_eq!(effective_size((734, 293), 1.0), (734, 293));
/// assert_eq!(effective_size((734, 293), 2.0), (1468, 586));
/// assert_eq!(effective_size((734, 293), 0.5), (367, 147));
/// ```
pub fn effective_size(banner: (u32, u32), zoom: f32) -> (u32, u32) {
    let (bw, bh) = banner;
    (
        (bw as f64 * zoom as f64).round() as u32,
        (bh as f64 * zoom as f64).round() as u32,
    )
}

/// Largest valid top-left offset for a viewport of `effective` size.
///
/// Zero on an axis where the viewport covers (or exceeds) the source.
pub fn max_offset(source: (u32, u32), effective: (u32, u32)) -> (u32, u32) {
    (
        source.0.saturating_sub(effective.0),
        source.1.saturating_sub(effective.1),
    )
}

/// Default-zoom region centered on the source.
///
/// `x = floor((source_w - banner_w) / 2)`, zero when the source is not
/// wider than the banner; analogous for `y`.
pub fn initial_region(source: (u32, u32), banner: (u32, u32)) -> CropRegion {
    let (sw, sh) = source;
    let (bw, bh) = banner;
    CropRegion {
        x: sw.saturating_sub(bw) / 2,
        y: sh.saturating_sub(bh) / 2,
        zoom: 1.0,
    }
}

/// Force a region back inside its valid range.
///
/// Zoom is bounded first; offsets are then clamped against the viewport
/// at the bounded zoom.
pub fn clamp_region(region: CropRegion, source: (u32, u32), banner: (u32, u32)) -> CropRegion {
    let zoom = region.zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    let (mx, my) = max_offset(source, effective_size(banner, zoom));
    CropRegion {
        x: region.x.min(mx),
        y: region.y.min(my),
        zoom,
    }
}

/// Apply one move command: `step` pixels along one axis, clamped.
///
/// Idempotent at boundaries — a move past a bound leaves the region at
/// the bound.
pub fn shift(
    region: CropRegion,
    direction: Direction,
    step: u32,
    source: (u32, u32),
    banner: (u32, u32),
) -> CropRegion {
    let (mx, my) = max_offset(source, effective_size(banner, region.zoom));
    let (x, y) = match direction {
        Direction::Left => (region.x.saturating_sub(step), region.y),
        Direction::Right => (region.x.saturating_add(step).min(mx), region.y),
        Direction::Up => (region.x, region.y.saturating_sub(step)),
        Direction::Down => (region.x, region.y.saturating_add(step).min(my)),
    };
    CropRegion { x, y, ..region }
}

/// Apply one zoom command: add `delta` to the zoom factor, bound it, then
/// re-clamp the offsets against the new viewport.
///
/// The bound is enforced before the rectangle is recomputed — zooming in
/// shrinks the valid offset range and must never leave the rectangle out
/// of bounds.
pub fn apply_zoom(
    region: CropRegion,
    delta: f32,
    source: (u32, u32),
    banner: (u32, u32),
) -> CropRegion {
    clamp_region(
        CropRegion {
            zoom: region.zoom + delta,
            ..region
        },
        source,
        banner,
    )
}

/// Concrete crop rectangle for a region: `(x, y, width, height)` in
/// source pixels, truncated at the source edges.
///
/// At high zoom the viewport can be larger than the source; the rectangle
/// then covers whatever the source has left past the offset.
pub fn crop_rect(region: CropRegion, source: (u32, u32), banner: (u32, u32)) -> (u32, u32, u32, u32) {
    let (ew, eh) = effective_size(banner, region.zoom);
    let (sw, sh) = source;
    (
        region.x,
        region.y,
        ew.min(sw.saturating_sub(region.x)),
        eh.min(sh.saturating_sub(region.y)),
    )
}

/// Dimensions an undersized source must be upscaled to so the banner
/// viewport always fits.
///
/// Returns `None` when the source already covers the banner on both
/// axes. Otherwise applies the larger of the two required scale factors,
/// preserving aspect ratio up to integer rounding, with a per-axis floor
/// at the banner dimension so rounding can never undershoot.
pub fn upscale_to_cover(source: (u32, u32), banner: (u32, u32)) -> Option<(u32, u32)> {
    let (sw, sh) = source;
    let (bw, bh) = banner;
    if sw >= bw && sh >= bh {
        return None;
    }
    let scale = f64::max(bw as f64 / sw as f64, bh as f64 / sh as f64);
    Some((
        ((sw as f64 * scale).round() as u32).max(bw),
        ((sh as f64 * scale).round() as u32).max(bh),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: (u32, u32) = (734, 293);

    // =========================================================================
    // effective_size / max_offset
    // =========================================================================

    #[test]
    fn effective_size_rounds_to_whole_pixels() {
        // 734 * 1.5 = 1101, 293 * 1.5 = 439.5 → 440
        assert_eq!(effective_size(BANNER, 1.5), (1101, 440));
    }

    #[test]
    fn max_offset_zero_when_viewport_covers_source() {
        assert_eq!(max_offset((1000, 500), (1468, 586)), (0, 0));
    }

    #[test]
    fn max_offset_is_remaining_slack() {
        assert_eq!(max_offset((1000, 500), (734, 293)), (266, 207));
    }

    // =========================================================================
    // initial_region
    // =========================================================================

    #[test]
    fn initial_region_centers_with_floor_division() {
        // floor((1000-734)/2) = 133, floor((500-293)/2) = 103
        let r = initial_region((1000, 500), BANNER);
        assert_eq!((r.x, r.y), (133, 103));
        assert_eq!(r.zoom, 1.0);
    }

    #[test]
    fn initial_region_at_exact_banner_size_is_origin() {
        let r = initial_region(BANNER, BANNER);
        assert_eq!((r.x, r.y), (0, 0));
    }

    // =========================================================================
    // shift
    // =========================================================================

    #[test]
    fn shift_moves_by_step_within_bounds() {
        let r = initial_region((1000, 500), BANNER);
        let moved = shift(r, Direction::Right, 32, (1000, 500), BANNER);
        assert_eq!((moved.x, moved.y), (165, 103));
    }

    #[test]
    fn shift_left_is_idempotent_at_zero() {
        let mut r = CropRegion { x: 10, y: 0, zoom: 1.0 };
        r = shift(r, Direction::Left, 32, (1000, 500), BANNER);
        assert_eq!(r.x, 0);
        r = shift(r, Direction::Left, 32, (1000, 500), BANNER);
        assert_eq!(r.x, 0);
    }

    #[test]
    fn shift_right_is_idempotent_at_max() {
        let mut r = CropRegion { x: 250, y: 0, zoom: 1.0 };
        r = shift(r, Direction::Right, 32, (1000, 500), BANNER);
        assert_eq!(r.x, 266); // 1000 - 734
        r = shift(r, Direction::Right, 32, (1000, 500), BANNER);
        assert_eq!(r.x, 266);
    }

    #[test]
    fn shift_noop_when_source_matches_banner() {
        let r = initial_region(BANNER, BANNER);
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            let moved = shift(r, dir, 32, BANNER, BANNER);
            assert_eq!((moved.x, moved.y), (0, 0));
        }
    }

    // =========================================================================
    // apply_zoom
    // =========================================================================

    #[test]
    fn zoom_in_then_out_restores_prior_value_within_bounds() {
        let r = CropRegion { x: 50, y: 40, zoom: 1.0 };
        let zoomed = apply_zoom(r, 0.25, (2000, 1000), BANNER);
        assert_eq!(zoomed.zoom, 1.25);
        let back = apply_zoom(zoomed, -0.25, (2000, 1000), BANNER);
        assert_eq!(back.zoom, 1.0);
    }

    #[test]
    fn zoom_clamps_at_bounds() {
        let r = CropRegion { x: 0, y: 0, zoom: 2.9 };
        assert_eq!(apply_zoom(r, 0.25, (4000, 2000), BANNER).zoom, ZOOM_MAX);
        let r = CropRegion { x: 0, y: 0, zoom: 0.6 };
        assert_eq!(apply_zoom(r, -0.25, (4000, 2000), BANNER).zoom, ZOOM_MIN);
    }

    #[test]
    fn zoom_reclamps_offsets_against_new_viewport() {
        // Spec worked example: 1000x500 source, zoom to 2.0 → viewport
        // 1468x586 exceeds the source, rectangle pins to the origin.
        let r = CropRegion { x: 133, y: 103, zoom: 1.0 };
        let zoomed = apply_zoom(r, 1.0, (1000, 500), BANNER);
        assert_eq!((zoomed.x, zoomed.y), (0, 0));
        assert_eq!(zoomed.zoom, 2.0);
    }

    #[test]
    fn invariant_holds_under_arbitrary_command_sequences() {
        let source = (1200, 700);
        let mut r = initial_region(source, BANNER);
        let script = [
            (Some(Direction::Right), 0.0),
            (None, 0.25),
            (Some(Direction::Down), 0.0),
            (None, 0.25),
            (None, 0.25),
            (Some(Direction::Right), 0.0),
            (None, -0.25),
            (Some(Direction::Left), 0.0),
            (None, 1.5),
            (Some(Direction::Up), 0.0),
            (None, -3.0),
        ];
        for (dir, delta) in script {
            r = match dir {
                Some(d) => shift(r, d, 48, source, BANNER),
                None => apply_zoom(r, delta, source, BANNER),
            };
            let (mx, my) = max_offset(source, effective_size(BANNER, r.zoom));
            assert!(r.x <= mx, "x={} exceeds max {}", r.x, mx);
            assert!(r.y <= my, "y={} exceeds max {}", r.y, my);
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&r.zoom));
        }
    }

    // =========================================================================
    // crop_rect
    // =========================================================================

    #[test]
    fn crop_rect_matches_viewport_inside_source() {
        let r = CropRegion { x: 133, y: 103, zoom: 1.0 };
        assert_eq!(crop_rect(r, (1000, 500), BANNER), (133, 103, 734, 293));
    }

    #[test]
    fn crop_rect_truncates_at_source_edges() {
        let r = CropRegion { x: 0, y: 0, zoom: 2.0 };
        // Viewport 1468x586 over a 1000x500 source.
        assert_eq!(crop_rect(r, (1000, 500), BANNER), (0, 0, 1000, 500));
    }

    // =========================================================================
    // upscale_to_cover
    // =========================================================================

    #[test]
    fn upscale_none_when_source_covers_banner() {
        assert_eq!(upscale_to_cover((1000, 500), BANNER), None);
        assert_eq!(upscale_to_cover(BANNER, BANNER), None);
    }

    #[test]
    fn upscale_uses_larger_scale_factor() {
        // 367x200: width needs 734/367 = 2.0, height needs 293/200 = 1.465.
        // Width factor wins → 734 x 400.
        assert_eq!(upscale_to_cover((367, 200), BANNER), Some((734, 400)));
    }

    #[test]
    fn upscale_output_covers_banner_on_both_axes() {
        for source in [(100, 100), (733, 292), (50, 600), (600, 50)] {
            let (w, h) = upscale_to_cover(source, BANNER).unwrap();
            assert!(w >= BANNER.0 && h >= BANNER.1, "{source:?} → ({w}, {h})");
        }
    }

    #[test]
    fn upscale_preserves_aspect_ratio_to_rounding() {
        let (sw, sh) = (320, 200);
        let (w, h) = upscale_to_cover((sw, sh), BANNER).unwrap();
        let original = sw as f64 / sh as f64;
        let scaled = w as f64 / h as f64;
        // Worst case error is half a pixel on each axis.
        assert!((original - scaled).abs() < 0.01, "{original} vs {scaled}");
    }
}
