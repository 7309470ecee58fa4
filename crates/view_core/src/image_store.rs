//! Pixel buffers and content-altering filters

use image::{imageops, DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Content filters a user can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Grayscale,
    Sepia,
    Negative,
    /// Drop every filter and go back to the pristine source
    ResetToSource,
}

impl FilterKind {
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Grayscale => "Grayscale",
            FilterKind::Sepia => "Sepia",
            FilterKind::Negative => "Negative",
            FilterKind::ResetToSource => "Normal",
        }
    }
}

/// Owns the source and base buffers.
///
/// `source` is the image as decoded and is never modified. `base` starts as a
/// copy of it and is replaced by every filter, so filters compound.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    source: Option<RgbaImage>,
    base: Option<RgbaImage>,
}

/// A zero-area buffer counts as no image
pub(crate) fn non_empty(image: RgbaImage) -> Option<RgbaImage> {
    if image.width() == 0 || image.height() == 0 {
        None
    } else {
        Some(image)
    }
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace both buffers with `image`. Returns false if the image is empty.
    pub fn load(&mut self, image: RgbaImage) -> bool {
        self.source = non_empty(image);
        self.base = self.source.clone();
        self.source.is_some()
    }

    /// Drop both buffers
    pub fn clear(&mut self) {
        self.source = None;
        self.base = None;
    }

    pub fn source(&self) -> Option<&RgbaImage> {
        self.source.as_ref()
    }

    pub fn base(&self) -> Option<&RgbaImage> {
        self.base.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_none()
    }

    /// Replace only the base buffer, leaving the source alone
    pub(crate) fn set_base(&mut self, image: Option<RgbaImage>) {
        self.base = image.and_then(non_empty);
    }

    pub fn apply_grayscale(&mut self) -> bool {
        self.replace_base(grayscale)
    }

    pub fn apply_sepia(&mut self) -> bool {
        self.replace_base(sepia)
    }

    pub fn apply_negative(&mut self) -> bool {
        self.replace_base(negative)
    }

    /// Restore the base to the source. The only identity reset.
    pub fn reset_to_source(&mut self) -> bool {
        if self.source.is_none() {
            return false;
        }
        self.base = self.source.clone();
        true
    }

    /// Apply a filter by kind
    pub fn apply(&mut self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::Grayscale => self.apply_grayscale(),
            FilterKind::Sepia => self.apply_sepia(),
            FilterKind::Negative => self.apply_negative(),
            FilterKind::ResetToSource => self.reset_to_source(),
        }
    }

    fn replace_base(&mut self, filter: fn(&RgbaImage) -> RgbaImage) -> bool {
        match &self.base {
            Some(base) => {
                self.base = Some(filter(base));
                true
            }
            None => false,
        }
    }
}

/// 8-bit luma conversion, alpha preserved
pub fn grayscale(image: &RgbaImage) -> RgbaImage {
    DynamicImage::ImageLumaA8(imageops::grayscale_alpha(image)).into_rgba8()
}

/// Classic sepia tone matrix. The result is fully opaque.
pub fn sepia(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let (r, g, b) = (r as f64, g as f64, b as f64);

        let tone = |cr: f64, cg: f64, cb: f64| (cr * r + cg * g + cb * b).min(255.0) as u8;

        *pixel = Rgba([
            tone(0.393, 0.769, 0.189),
            tone(0.349, 0.686, 0.168),
            tone(0.272, 0.534, 0.131),
            255,
        ]);
    }
    out
}

/// Per-channel `255 - v` on RGB, alpha preserved
pub fn negative(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    imageops::invert(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    #[test]
    fn test_load_sets_source_and_base() {
        let mut store = ImageStore::new();
        assert!(store.load(solid(2, 2, [10, 20, 30, 255])));
        assert_eq!(store.source(), store.base());
    }

    #[test]
    fn test_load_empty_buffer_is_empty() {
        let mut store = ImageStore::new();
        assert!(!store.load(RgbaImage::new(0, 5)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_filters_on_empty_are_noops() {
        let mut store = ImageStore::new();
        assert!(!store.apply_grayscale());
        assert!(!store.apply_sepia());
        assert!(!store.apply_negative());
        assert!(!store.reset_to_source());
        assert!(store.is_empty());
    }

    #[test]
    fn test_negative_inverts_rgb_keeps_alpha() {
        let out = negative(&solid(1, 1, [0, 100, 255, 77]));
        assert_eq!(out.get_pixel(0, 0).0, [255, 155, 0, 77]);
    }

    #[test]
    fn test_negative_twice_is_identity() {
        let mut store = ImageStore::new();
        let image = solid(3, 2, [1, 2, 3, 4]);
        store.load(image.clone());
        store.apply_negative();
        store.apply_negative();
        assert_eq!(store.base(), Some(&image));
    }

    #[test]
    fn test_sepia_coefficients() {
        let out = sepia(&solid(1, 1, [100, 50, 20, 128]));
        // 39.3+38.45+3.78, 34.9+34.3+3.36, 27.2+26.7+2.62
        assert_eq!(out.get_pixel(0, 0).0, [81, 72, 56, 255]);
    }

    #[test]
    fn test_sepia_saturates() {
        let out = sepia(&solid(1, 1, [255, 255, 255, 255]));
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 238, 255]);
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let out = grayscale(&solid(1, 1, [200, 30, 90, 40]));
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 40);
    }

    #[test]
    fn test_filters_compound_on_base() {
        let mut store = ImageStore::new();
        let image = solid(2, 2, [200, 30, 90, 255]);
        store.load(image.clone());

        store.apply_grayscale();
        store.apply_sepia();

        assert_eq!(store.base(), Some(&sepia(&grayscale(&image))));
        assert_ne!(store.base(), Some(&sepia(&image)));
        assert_eq!(store.source(), Some(&image));
    }

    #[test]
    fn test_reset_to_source() {
        let mut store = ImageStore::new();
        let image = solid(2, 1, [5, 6, 7, 255]);
        store.load(image.clone());
        store.apply_sepia();
        store.apply_negative();

        assert!(store.apply(FilterKind::ResetToSource));
        assert_eq!(store.base(), Some(&image));
    }
}
