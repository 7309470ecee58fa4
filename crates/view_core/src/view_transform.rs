//! View geometry: zoom, rotation, flips and scroll
//!
//! `ViewTransform` is plain state plus [`ViewTransform::render`], the pure
//! function that derives the displayed buffer from a base buffer. The order
//! of the pipeline is fixed:
//!
//! 1. horizontal mirror
//! 2. vertical mirror
//! 3. rotation, growing the canvas to the rotated bounding box
//! 4. uniform scale by the zoom factor
//!
//! Scroll offset is not part of the rendition; it only moves the paint origin.

use crate::config::Interpolation;
use image::{imageops, Rgba, RgbaImage};
use rayon::prelude::*;

/// Interactive zoom bounds
pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 10.0;

/// Bounds for a zoom computed by fit-to-view
pub const FIT_ZOOM_MIN: f64 = 0.01;
pub const FIT_ZOOM_MAX: f64 = 100.0;

/// Fill for the corners a non-quarter rotation leaves uncovered
pub const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub(crate) zoom_factor: f64,
    /// Clockwise degrees in [0, 360)
    pub(crate) rotation_angle: f64,
    pub(crate) flipped_horizontal: bool,
    pub(crate) flipped_vertical: bool,
    /// Pixels, relative to the view center
    pub(crate) scroll_offset: (i32, i32),
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom_factor: 1.0,
            rotation_angle: 0.0,
            flipped_horizontal: false,
            flipped_vertical: false,
            scroll_offset: (0, 0),
        }
    }
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn flipped_horizontal(&self) -> bool {
        self.flipped_horizontal
    }

    pub fn flipped_vertical(&self) -> bool {
        self.flipped_vertical
    }

    pub fn scroll_offset(&self) -> (i32, i32) {
        self.scroll_offset
    }

    /// Set zoom, clamped to [`ZOOM_MIN`, `ZOOM_MAX`]. NaN is ignored.
    ///
    /// Returns `false` when the zoom factor did not change, e.g. for NaN or
    /// when already at the clamp boundary.
    pub fn set_zoom(&mut self, factor: f64) -> bool {
        if factor.is_nan() {
            return false;
        }
        let zoom = factor.clamp(ZOOM_MIN, ZOOM_MAX);
        if zoom == self.zoom_factor {
            return false;
        }
        self.zoom_factor = zoom;
        true
    }

    pub fn zoom_in(&mut self, step: f64) -> bool {
        self.set_zoom(self.zoom_factor * step)
    }

    pub fn zoom_out(&mut self, step: f64) -> bool {
        self.set_zoom(self.zoom_factor / step)
    }

    /// Accumulate a rotation and normalize into [0, 360).
    /// Returns `false` if the angle is unchanged; non-finite deltas are ignored.
    pub fn rotate(&mut self, delta_degrees: f64) -> bool {
        if !delta_degrees.is_finite() {
            return false;
        }
        let angle = normalize_angle(self.rotation_angle + delta_degrees);
        if angle == self.rotation_angle {
            return false;
        }
        self.rotation_angle = angle;
        true
    }

    pub fn toggle_flip_horizontal(&mut self) {
        self.flipped_horizontal = !self.flipped_horizontal;
    }

    pub fn toggle_flip_vertical(&mut self) {
        self.flipped_vertical = !self.flipped_vertical;
    }

    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        self.scroll_offset = (
            self.scroll_offset.0.saturating_add(dx),
            self.scroll_offset.1.saturating_add(dy),
        );
    }

    pub fn set_scroll_offset(&mut self, offset: (i32, i32)) {
        self.scroll_offset = offset;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Zoom so the rotated bounding box of `base` fits the viewport.
    ///
    /// Without a base image or with a zero-area viewport the zoom falls back
    /// to 1.0.
    pub fn fit_to_view(&mut self, base: Option<&RgbaImage>, viewport_width: u32, viewport_height: u32) {
        let base = match base {
            Some(b) if viewport_width > 0 && viewport_height > 0 => b,
            _ => {
                self.zoom_factor = 1.0;
                return;
            }
        };

        let (box_w, box_h) = rotated_bounds(base.width() as f64, base.height() as f64, self.rotation_angle);
        let view_w = viewport_width as f64;
        let view_h = viewport_height as f64;

        let view_ratio = view_w / view_h;
        let image_ratio = box_w / box_h;

        let zoom = if image_ratio > view_ratio {
            view_w / box_w
        } else {
            view_h / box_h
        };

        self.zoom_factor = zoom.clamp(FIT_ZOOM_MIN, FIT_ZOOM_MAX);
    }

    /// Derive the displayed buffer from `base`.
    ///
    /// Returns `None` when the zoomed size rounds to zero in either dimension.
    pub fn render(&self, base: &RgbaImage, interpolation: Interpolation) -> Option<RgbaImage> {
        let mut image = base.clone();

        if self.flipped_horizontal {
            imageops::flip_horizontal_in_place(&mut image);
        }
        if self.flipped_vertical {
            imageops::flip_vertical_in_place(&mut image);
        }

        let image = rotate_bounded(image, self.rotation_angle, interpolation);

        let target_w = (image.width() as f64 * self.zoom_factor).round();
        let target_h = (image.height() as f64 * self.zoom_factor).round();
        if target_w <= 0.0 || target_h <= 0.0 || !target_w.is_finite() || !target_h.is_finite() {
            return None;
        }

        let (target_w, target_h) = (target_w as u32, target_h as u32);
        if (target_w, target_h) == image.dimensions() {
            return Some(image);
        }

        Some(imageops::resize(&image, target_w, target_h, interpolation.filter_type()))
    }
}

/// Top-left corner at which a `image_size` rendition is painted so that it is
/// centered in `view_size` and then shifted by `scroll_offset`
pub fn paint_origin(view_size: (u32, u32), image_size: (u32, u32), scroll_offset: (i32, i32)) -> (i32, i32) {
    let x = (view_size.0 as i64 - image_size.0 as i64) / 2 + scroll_offset.0 as i64;
    let y = (view_size.1 as i64 - image_size.1 as i64) / 2 + scroll_offset.1 as i64;
    (saturate_i32(x), saturate_i32(y))
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

pub(crate) fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a < 0.0 {
        a += 360.0;
    }
    // -1e-14 + 360 rounds to 360; -0.0 is folded to 0.0
    if a >= 360.0 || a == 0.0 {
        a = 0.0;
    }
    a
}

/// (sin, cos) of a clockwise angle, exact on multiples of 90 degrees
fn sin_cos_degrees(angle: f64) -> (f64, f64) {
    let a = normalize_angle(angle);
    if a == 0.0 {
        (0.0, 1.0)
    } else if a == 90.0 {
        (1.0, 0.0)
    } else if a == 180.0 {
        (0.0, -1.0)
    } else if a == 270.0 {
        (-1.0, 0.0)
    } else {
        a.to_radians().sin_cos()
    }
}

/// Size of the axis-aligned box containing a `width` x `height` rectangle
/// rotated by `angle` degrees
pub fn rotated_bounds(width: f64, height: f64, angle: f64) -> (f64, f64) {
    let (sin, cos) = sin_cos_degrees(angle);
    (
        (width * cos).abs() + (height * sin).abs(),
        (width * sin).abs() + (height * cos).abs(),
    )
}

/// Rotate clockwise about the center, growing the canvas to the bounding box.
///
/// Quarter turns are lossless; other angles are resampled with uncovered
/// corners left transparent.
fn rotate_bounded(image: RgbaImage, angle: f64, interpolation: Interpolation) -> RgbaImage {
    let a = normalize_angle(angle);
    if a == 0.0 {
        return image;
    } else if a == 90.0 {
        return imageops::rotate90(&image);
    } else if a == 180.0 {
        return imageops::rotate180(&image);
    } else if a == 270.0 {
        return imageops::rotate270(&image);
    }

    let (src_w, src_h) = (image.width() as f64, image.height() as f64);
    let (box_w, box_h) = rotated_bounds(src_w, src_h, a);
    let out_w = (box_w - 1e-9).ceil().max(1.0) as u32;
    let out_h = (box_h - 1e-9).ceil().max(1.0) as u32;

    let (sin, cos) = sin_cos_degrees(a);
    let (out_cx, out_cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);
    let (src_cx, src_cy) = (src_w / 2.0, src_h / 2.0);

    let mut out = RgbaImage::new(out_w, out_h);
    let row_len = out_w as usize * 4;

    out.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let dy = y as f64 + 0.5 - out_cy;
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let dx = x as f64 + 0.5 - out_cx;
            // Inverse of a clockwise rotation in y-down coordinates
            let sx = cos * dx + sin * dy + src_cx - 0.5;
            let sy = -sin * dx + cos * dy + src_cy - 0.5;

            let sample = match interpolation {
                Interpolation::Nearest => sample_nearest(&image, sx, sy),
                Interpolation::Bilinear | Interpolation::Lanczos3 => sample_bilinear(&image, sx, sy),
            };
            px.copy_from_slice(&sample);
        }
    });

    out
}

fn pixel_or_clear(image: &RgbaImage, x: i64, y: i64) -> [u8; 4] {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        CLEAR.0
    } else {
        image.get_pixel(x as u32, y as u32).0
    }
}

fn sample_nearest(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    pixel_or_clear(image, x.round() as i64, y.round() as i64)
}

fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = pixel_or_clear(image, x0, y0);
    let p10 = pixel_or_clear(image, x0 + 1, y0);
    let p01 = pixel_or_clear(image, x0, y0 + 1);
    let p11 = pixel_or_clear(image, x0 + 1, y0 + 1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]))
    }

    #[test]
    fn test_rotation_normalization() {
        let mut t = ViewTransform::new();
        t.rotate(-90.0);
        assert_eq!(t.rotation_angle(), 270.0);

        t.rotate(90.0);
        assert_eq!(t.rotation_angle(), 0.0);

        t.rotate(45.0);
        for n in [-3_i32, -1, 1, 2, 7] {
            t.rotate(360.0 * n as f64);
            assert_eq!(t.rotation_angle(), 45.0);
        }

        t.rotate(-405.0);
        assert_eq!(t.rotation_angle(), 0.0);
        assert!(t.rotation_angle().is_sign_positive());
    }

    #[test]
    fn test_zoom_clamp() {
        let mut t = ViewTransform::new();
        for x in [-5.0, 0.0, 0.05, 0.1, 1.0, 9.99, 10.0, 1e9, f64::INFINITY, f64::NEG_INFINITY] {
            t.set_zoom(x);
            assert!((ZOOM_MIN..=ZOOM_MAX).contains(&t.zoom_factor()), "zoom {x}");
        }
        assert!(t.set_zoom(2.0));
        assert!(!t.set_zoom(f64::NAN));
        assert!(!t.set_zoom(2.0));
        assert_eq!(t.zoom_factor(), 2.0);

        t.set_zoom(ZOOM_MAX);
        assert!(!t.zoom_in(1.2));
    }

    #[test]
    fn test_unchanged_rotation_reports_false() {
        let mut t = ViewTransform::new();
        assert!(!t.rotate(f64::NAN));
        assert!(!t.rotate(f64::INFINITY));
        assert!(!t.rotate(f64::NEG_INFINITY));
        assert!(!t.rotate(720.0));
        assert_eq!(t.rotation_angle(), 0.0);

        assert!(t.rotate(30.0));
        assert_eq!(t.rotation_angle(), 30.0);
    }

    #[test]
    fn test_zoom_steps() {
        let mut t = ViewTransform::new();
        t.zoom_in(1.2);
        assert!((t.zoom_factor() - 1.2).abs() < 1e-12);
        t.zoom_out(1.2);
        assert!((t.zoom_factor() - 1.0).abs() < 1e-12);
        for _ in 0..50 {
            t.zoom_out(1.2);
        }
        assert_eq!(t.zoom_factor(), ZOOM_MIN);
    }

    #[test]
    fn test_fit_rotated_image_height_constrained() {
        let base = RgbaImage::new(100, 50);
        let mut t = ViewTransform::new();
        t.rotate(90.0);
        t.fit_to_view(Some(&base), 200, 200);
        assert_eq!(t.zoom_factor(), 2.0);
    }

    #[test]
    fn test_fit_width_constrained() {
        let base = RgbaImage::new(100, 50);
        let mut t = ViewTransform::new();
        t.fit_to_view(Some(&base), 200, 200);
        assert_eq!(t.zoom_factor(), 2.0);

        t.fit_to_view(Some(&base), 50, 400);
        assert_eq!(t.zoom_factor(), 0.5);
    }

    #[test]
    fn test_fit_clamps_to_fit_bounds() {
        let mut t = ViewTransform::new();
        t.fit_to_view(Some(&RgbaImage::new(1, 1)), 5000, 5000);
        assert_eq!(t.zoom_factor(), FIT_ZOOM_MAX);

        t.fit_to_view(Some(&RgbaImage::new(10000, 10000)), 10, 10);
        assert_eq!(t.zoom_factor(), FIT_ZOOM_MIN);
    }

    #[test]
    fn test_fit_degenerate_resets_zoom() {
        let mut t = ViewTransform::new();
        t.set_zoom(3.0);
        t.fit_to_view(None, 100, 100);
        assert_eq!(t.zoom_factor(), 1.0);

        t.set_zoom(3.0);
        t.fit_to_view(Some(&RgbaImage::new(10, 10)), 0, 100);
        assert_eq!(t.zoom_factor(), 1.0);
    }

    #[test]
    fn test_render_identity_is_exact() {
        let base = gradient(4, 3);
        let out = ViewTransform::new().render(&base, Interpolation::Bilinear).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn test_render_flip_then_rotate_order() {
        let base = gradient(3, 2);
        let mut t = ViewTransform::new();
        t.toggle_flip_horizontal();
        t.rotate(90.0);

        let out = t.render(&base, Interpolation::Bilinear).unwrap();
        let expected = imageops::rotate90(&imageops::flip_horizontal(&base));
        assert_eq!(out, expected);
        assert_eq!(out.dimensions(), (2, 3));
    }

    #[test]
    fn test_render_both_flips_equals_half_turn() {
        let base = gradient(5, 4);
        let mut t = ViewTransform::new();
        t.toggle_flip_horizontal();
        t.toggle_flip_vertical();
        let flipped = t.render(&base, Interpolation::Nearest).unwrap();

        let mut r = ViewTransform::new();
        r.rotate(180.0);
        assert_eq!(flipped, r.render(&base, Interpolation::Nearest).unwrap());
    }

    #[test]
    fn test_render_arbitrary_angle_grows_canvas() {
        let base = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let mut t = ViewTransform::new();
        t.rotate(45.0);

        let out = t.render(&base, Interpolation::Bilinear).unwrap();
        // 10 * sqrt(2) = 14.14
        assert_eq!(out.dimensions(), (15, 15));
        assert_eq!(*out.get_pixel(0, 0), CLEAR);
        assert_eq!(out.get_pixel(7, 7).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_render_zoom_rounds_dimensions() {
        let base = gradient(10, 5);
        let mut t = ViewTransform::new();
        t.set_zoom(1.25);
        let out = t.render(&base, Interpolation::Bilinear).unwrap();
        assert_eq!(out.dimensions(), (13, 6));
    }

    #[test]
    fn test_render_collapses_to_empty() {
        let base = gradient(3, 3);
        let t = ViewTransform {
            zoom_factor: FIT_ZOOM_MIN,
            ..ViewTransform::default()
        };
        assert!(t.render(&base, Interpolation::Bilinear).is_none());
    }

    #[test]
    fn test_paint_origin_centers_and_scrolls() {
        assert_eq!(paint_origin((200, 100), (50, 20), (0, 0)), (75, 40));
        assert_eq!(paint_origin((200, 100), (50, 20), (-5, 7)), (70, 47));
        assert_eq!(paint_origin((10, 10), (31, 10), (0, 0)), (-10, 0));
    }

    #[test]
    fn test_reset() {
        let mut t = ViewTransform::new();
        t.rotate(30.0);
        t.set_zoom(4.0);
        t.toggle_flip_vertical();
        t.scroll_by(3, -4);
        t.reset();
        assert_eq!(t, ViewTransform::default());
    }
}
