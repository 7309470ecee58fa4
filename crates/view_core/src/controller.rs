//! Viewer controller: ImageStore + ViewTransform behind one state machine
//!
//! The controller is either Empty (no image) or Loaded. In Empty every
//! mutator except [`ViewerController::load`] is a no-op returning `false`.
//! Every mutator that does apply recomputes the displayed buffer before it
//! returns and raises the repaint flag.

use crate::config::Interpolation;
use crate::image_store::{FilterKind, ImageStore};
use crate::view_transform::{self, ViewTransform};
use image::RgbaImage;

/// Deep snapshot of everything undo/redo restores
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub base_image: Option<RgbaImage>,
    pub zoom_factor: f64,
    pub rotation_angle: f64,
    pub flipped_horizontal: bool,
    pub flipped_vertical: bool,
    pub scroll_offset: (i32, i32),
}

pub struct ViewerController {
    store: ImageStore,
    transform: ViewTransform,
    displayed: Option<RgbaImage>,
    interpolation: Interpolation,
    repaint_requested: bool,
}

impl Default for ViewerController {
    fn default() -> Self {
        Self::new(Interpolation::default())
    }
}

impl ViewerController {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            store: ImageStore::new(),
            transform: ViewTransform::new(),
            displayed: None,
            interpolation,
            repaint_requested: false,
        }
    }

    // ===== Accessors =====

    pub fn is_loaded(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn source_image(&self) -> Option<&RgbaImage> {
        self.store.source()
    }

    pub fn base_image(&self) -> Option<&RgbaImage> {
        self.store.base()
    }

    pub fn displayed_image(&self) -> Option<&RgbaImage> {
        self.displayed.as_ref()
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn zoom_factor(&self) -> f64 {
        self.transform.zoom_factor()
    }

    pub fn rotation_angle(&self) -> f64 {
        self.transform.rotation_angle()
    }

    pub fn flipped_horizontal(&self) -> bool {
        self.transform.flipped_horizontal()
    }

    pub fn flipped_vertical(&self) -> bool {
        self.transform.flipped_vertical()
    }

    pub fn scroll_offset(&self) -> (i32, i32) {
        self.transform.scroll_offset()
    }

    /// Where the displayed buffer is painted inside a view of the given size
    pub fn paint_origin(&self, view_width: u32, view_height: u32) -> Option<(i32, i32)> {
        self.displayed.as_ref().map(|img| {
            view_transform::paint_origin((view_width, view_height), img.dimensions(), self.scroll_offset())
        })
    }

    /// Returns and clears the pending repaint request
    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    // ===== Loading =====

    /// Load a new image: source and base are replaced, the view is reset.
    pub fn load(&mut self, image: RgbaImage) -> bool {
        let (width, height) = image.dimensions();
        let loaded = self.store.load(image);
        self.transform.reset();
        self.recompose();
        tracing::debug!("Loaded {}x{} image (loaded={})", width, height, loaded);
        loaded
    }

    /// Drop the image and go back to Empty
    pub fn unload(&mut self) {
        self.store.clear();
        self.transform.reset();
        self.recompose();
    }

    /// Replace the base buffer while keeping zoom, rotation, flips and scroll
    pub fn set_image_data_only(&mut self, image: RgbaImage) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.store.set_base(Some(image));
        self.recompose();
        true
    }

    // ===== Mutators =====

    pub fn rotate(&mut self, delta_degrees: f64) -> bool {
        self.mutate(|t, _| t.rotate(delta_degrees))
    }

    pub fn flip_horizontal(&mut self) -> bool {
        self.mutate(|t, _| {
            t.toggle_flip_horizontal();
            true
        })
    }

    pub fn flip_vertical(&mut self) -> bool {
        self.mutate(|t, _| {
            t.toggle_flip_vertical();
            true
        })
    }

    pub fn set_zoom(&mut self, factor: f64) -> bool {
        self.mutate(|t, _| t.set_zoom(factor))
    }

    pub fn zoom_in(&mut self, step: f64) -> bool {
        self.mutate(|t, _| t.zoom_in(step))
    }

    pub fn zoom_out(&mut self, step: f64) -> bool {
        self.mutate(|t, _| t.zoom_out(step))
    }

    pub fn fit_to_view(&mut self, viewport_width: u32, viewport_height: u32) -> bool {
        self.mutate(|t, base| {
            t.fit_to_view(base, viewport_width, viewport_height);
            true
        })
    }

    /// Pan. Only the paint origin moves, so nothing is recomposed.
    pub fn scroll_by(&mut self, dx: i32, dy: i32) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.transform.scroll_by(dx, dy);
        self.repaint_requested = true;
        true
    }

    /// Reset zoom, rotation, flips and scroll, keeping filters
    pub fn reset_view(&mut self) -> bool {
        self.mutate(|t, _| {
            t.reset();
            true
        })
    }

    pub fn apply_filter(&mut self, kind: FilterKind) -> bool {
        if !self.store.apply(kind) {
            tracing::debug!("Filter {:?} ignored: no image", kind);
            return false;
        }
        self.recompose();
        true
    }

    // ===== Snapshots =====

    /// Deep copy of the current base image and geometry
    pub fn capture_state(&self) -> ViewerState {
        ViewerState {
            base_image: self.store.base().cloned(),
            zoom_factor: self.transform.zoom_factor,
            rotation_angle: self.transform.rotation_angle,
            flipped_horizontal: self.transform.flipped_horizontal,
            flipped_vertical: self.transform.flipped_vertical,
            scroll_offset: self.transform.scroll_offset,
        }
    }

    /// Put a captured state back. Values are trusted as-is, without clamping.
    pub fn restore_state(&mut self, state: &ViewerState) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.store.set_base(state.base_image.clone());
        self.transform = ViewTransform {
            zoom_factor: state.zoom_factor,
            rotation_angle: state.rotation_angle,
            flipped_horizontal: state.flipped_horizontal,
            flipped_vertical: state.flipped_vertical,
            scroll_offset: state.scroll_offset,
        };
        self.recompose();
        true
    }

    /// Apply `f` to the transform and recompose. `f` returns `false` when
    /// it left the transform unchanged, in which case nothing is redrawn.
    fn mutate(&mut self, f: impl FnOnce(&mut ViewTransform, Option<&RgbaImage>) -> bool) -> bool {
        if !self.is_loaded() {
            return false;
        }
        if !f(&mut self.transform, self.store.base()) {
            return false;
        }
        self.recompose();
        true
    }

    fn recompose(&mut self) {
        self.displayed = self
            .store
            .base()
            .and_then(|base| self.transform.render(base, self.interpolation));
        self.repaint_requested = true;
    }
}
