//! Viewer session: the host-facing layer over controller, history and gallery
//!
//! Every user intent goes through here. Rotations, flips and filters are
//! recorded in the undo history; zoom, fit and pan are view-only and are not.
//! Opening anything new clears the history.

use crate::command::{Command, CommandId};
use crate::config::AppConfig;
use crate::controller::ViewerController;
use crate::gallery::GalleryIndex;
use crate::history::{EditKind, UndoCommand, UndoEngine};
use crate::image_loader::{self, ImageMetadata};
use crate::image_store::FilterKind;
use crate::registry::{ControllerId, ControllerRegistry};
use crate::ViewerError;
use image::RgbaImage;
use std::path::{Path, PathBuf};

pub struct ViewerSession {
    config: AppConfig,
    controllers: ControllerRegistry,
    viewer: ControllerId,
    history: UndoEngine,
    gallery: GalleryIndex,
    viewport: Option<(u32, u32)>,
    current_file: Option<PathBuf>,
}

impl ViewerSession {
    pub fn new(config: AppConfig) -> Self {
        let mut controllers = ControllerRegistry::new();
        let viewer = controllers.insert(ViewerController::new(config.viewer.interpolation));
        Self {
            config,
            controllers,
            viewer,
            history: UndoEngine::new(),
            gallery: GalleryIndex::new(),
            viewport: None,
            current_file: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> Option<&ViewerController> {
        self.controllers.get(self.viewer)
    }

    pub fn history(&self) -> &UndoEngine {
        &self.history
    }

    pub fn gallery(&self) -> &GalleryIndex {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut GalleryIndex {
        &mut self.gallery
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    pub fn displayed_image(&self) -> Option<&RgbaImage> {
        self.controller().and_then(ViewerController::displayed_image)
    }

    /// Viewport size used by fit-to-window and fit-on-open
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    pub fn take_repaint_request(&mut self) -> bool {
        self.controllers
            .get_mut(self.viewer)
            .map(ViewerController::take_repaint_request)
            .unwrap_or(false)
    }

    // ===== Opening =====

    /// Show a decoded image: history is cleared and the view starts fresh
    pub fn load_image(&mut self, image: RgbaImage) -> bool {
        self.history.clear();
        let fit = self.config.viewer.fit_on_open.then_some(self.viewport).flatten();
        let Some(controller) = self.controllers.get_mut(self.viewer) else {
            return false;
        };
        let loaded = controller.load(image);
        if let (true, Some((w, h))) = (loaded, fit) {
            controller.fit_to_view(w, h);
        }
        loaded
    }

    /// Open one file and sync the gallery to its directory.
    /// On a decode error nothing changes.
    pub fn open_file(&mut self, path: &Path) -> Result<(), ViewerError> {
        let image = self.decode(path)?;
        self.load_image(image);
        self.current_file = Some(path.to_path_buf());

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if self.gallery.directory() != Some(dir.as_path()) {
            if let Err(e) = self.gallery.load_directory(&dir) {
                tracing::warn!("Could not list {}: {}", dir.display(), e);
            }
        }
        if !self.gallery.select(path) {
            self.gallery.set_single(path);
        }
        Ok(())
    }

    /// List a directory and open its first image. With no images the viewer
    /// is emptied and `Ok(false)` returned. If listing or decoding fails the
    /// previous gallery and image stay as they were.
    pub fn open_directory(&mut self, dir: &Path) -> Result<bool, ViewerError> {
        let mut listing = GalleryIndex::new();
        listing.load_directory(dir)?;

        let Some(first) = listing.first_path().map(Path::to_path_buf) else {
            tracing::info!("No images in {}", dir.display());
            self.gallery.replace_with(listing);
            self.history.clear();
            self.current_file = None;
            if let Some(controller) = self.controllers.get_mut(self.viewer) {
                controller.unload();
            }
            return Ok(false);
        };

        let image = self.decode(&first)?;
        self.load_image(image);
        listing.select_index(0);
        self.gallery.replace_with(listing);
        self.current_file = Some(first);
        Ok(true)
    }

    /// Open `path` as a file or a directory
    pub fn open(&mut self, path: &Path) -> Result<bool, ViewerError> {
        if path.is_dir() {
            self.open_directory(path)
        } else {
            self.open_file(path).map(|_| true)
        }
    }

    pub fn navigate_next(&mut self) -> Result<bool, ViewerError> {
        let next = self.gallery.peek_next().map(|(i, p)| (i, p.to_path_buf()));
        self.open_gallery_entry(next)
    }

    pub fn navigate_previous(&mut self) -> Result<bool, ViewerError> {
        let prev = self.gallery.peek_prev().map(|(i, p)| (i, p.to_path_buf()));
        self.open_gallery_entry(prev)
    }

    /// Decode first, then move the selection. A failed decode leaves the
    /// selection on the image still shown.
    fn open_gallery_entry(&mut self, target: Option<(usize, PathBuf)>) -> Result<bool, ViewerError> {
        let Some((index, path)) = target else {
            return Ok(false);
        };
        let image = self.decode(&path)?;
        self.load_image(image);
        self.gallery.select_index(index);
        self.current_file = Some(path);
        Ok(true)
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, ViewerError> {
        match image_loader::load_image(path) {
            Ok(loaded) => {
                tracing::info!(
                    "Opened {} ({}x{}, hash {:016x})",
                    path.display(),
                    loaded.pixels.width(),
                    loaded.pixels.height(),
                    loaded.hash
                );
                Ok(loaded.pixels)
            }
            Err(e) => {
                tracing::warn!("Failed to open {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    // ===== Recorded edits =====

    pub fn rotate(&mut self, delta_degrees: f64) -> bool {
        self.record(EditKind::Rotate(delta_degrees), None, |c| c.rotate(delta_degrees))
    }

    pub fn rotate_right(&mut self) -> bool {
        self.rotate(90.0)
    }

    pub fn rotate_left(&mut self) -> bool {
        self.rotate(-90.0)
    }

    pub fn flip_horizontal(&mut self) -> bool {
        self.record(EditKind::FlipHorizontal, None, ViewerController::flip_horizontal)
    }

    pub fn flip_vertical(&mut self) -> bool {
        self.record(EditKind::FlipVertical, None, ViewerController::flip_vertical)
    }

    /// Apply a filter on top of the current base. `ResetToSource` instead
    /// reopens the source image: view reset and history cleared.
    pub fn apply_filter(&mut self, kind: FilterKind) -> bool {
        if kind == FilterKind::ResetToSource {
            let Some(source) = self.controller().and_then(ViewerController::source_image).cloned() else {
                return false;
            };
            return self.load_image(source);
        }
        let label = format!("Apply Filter ({})", kind.label());
        self.record(EditKind::Filter(kind), Some(label), |c| c.apply_filter(kind))
    }

    /// Run `edit` and push an undo command if it changed anything.
    /// `label` overrides the kind's default history text.
    fn record(
        &mut self,
        kind: EditKind,
        label: Option<String>,
        edit: impl FnOnce(&mut ViewerController) -> bool,
    ) -> bool {
        let Some(controller) = self.controllers.get_mut(self.viewer) else {
            return false;
        };
        let old_state = controller.capture_state();
        if !edit(&mut *controller) {
            return false;
        }
        let new_state = controller.capture_state();
        let command = UndoCommand::new(self.viewer, kind, old_state, new_state);
        self.history.push(match label {
            Some(label) => command.with_label(label),
            None => command,
        });
        true
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.controllers)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.controllers)
    }

    // ===== View-only changes =====

    fn view(&mut self, change: impl FnOnce(&mut ViewerController) -> bool) -> bool {
        self.controllers.get_mut(self.viewer).map(change).unwrap_or(false)
    }

    pub fn zoom_in(&mut self) -> bool {
        let step = self.config.viewer.zoom_step;
        self.view(|c| c.zoom_in(step))
    }

    pub fn zoom_out(&mut self) -> bool {
        let step = self.config.viewer.zoom_step;
        self.view(|c| c.zoom_out(step))
    }

    pub fn set_zoom(&mut self, factor: f64) -> bool {
        self.view(|c| c.set_zoom(factor))
    }

    pub fn actual_size(&mut self) -> bool {
        self.set_zoom(1.0)
    }

    /// Fit to the current viewport; `false` when none is known
    pub fn fit_to_window(&mut self) -> bool {
        match self.viewport {
            Some((w, h)) => self.fit_to(w, h),
            None => false,
        }
    }

    pub fn fit_to(&mut self, width: u32, height: u32) -> bool {
        self.view(|c| c.fit_to_view(width, height))
    }

    pub fn scroll_by(&mut self, dx: i32, dy: i32) -> bool {
        self.view(|c| c.scroll_by(dx, dy))
    }

    pub fn reset_view(&mut self) -> bool {
        self.view(ViewerController::reset_view)
    }

    // ===== Output =====

    /// Save what is currently displayed, format chosen by extension
    pub fn export_displayed(&self, path: &Path) -> Result<(), ViewerError> {
        let image = self.displayed_image().ok_or(ViewerError::NoImage)?;
        image_loader::export_image(image, path)
    }

    pub fn metadata(&self) -> Result<ImageMetadata, ViewerError> {
        let path = self.current_file.as_deref().ok_or(ViewerError::NoImage)?;
        image_loader::image_metadata(path)
    }

    // ===== Commands =====

    /// Run a parsed command. `Ok(false)` means it was a no-op.
    pub fn dispatch(&mut self, cmd: &Command) -> Result<bool, ViewerError> {
        let params = &cmd.params;
        let applied = match cmd.id.as_str() {
            CommandId::NAV_NEXT_ITEM => return self.navigate_next(),
            CommandId::NAV_PREV_ITEM => return self.navigate_previous(),
            CommandId::NAV_OPEN => {
                let path = params
                    .path_value
                    .clone()
                    .ok_or_else(|| ViewerError::InvalidCommand("open needs a path".into()))?;
                return self.open(&path);
            }
            CommandId::VIEW_ZOOM_IN => self.zoom_in(),
            CommandId::VIEW_ZOOM_OUT => self.zoom_out(),
            CommandId::VIEW_ZOOM_SET => match params.float_value {
                Some(factor) => self.set_zoom(factor),
                None => false,
            },
            CommandId::VIEW_FIT_TO_WINDOW => match params.pair_value {
                Some((w, h)) => self.fit_to(w.max(0) as u32, h.max(0) as u32),
                None => self.fit_to_window(),
            },
            CommandId::VIEW_ORIGINAL_SIZE => self.actual_size(),
            CommandId::VIEW_ROTATE_LEFT => self.rotate_left(),
            CommandId::VIEW_ROTATE_RIGHT => self.rotate_right(),
            CommandId::VIEW_ROTATE => match params.float_value {
                Some(angle) => self.rotate(angle),
                None => false,
            },
            CommandId::VIEW_FLIP_HORIZONTAL => self.flip_horizontal(),
            CommandId::VIEW_FLIP_VERTICAL => self.flip_vertical(),
            CommandId::VIEW_SCROLL => match params.pair_value {
                Some((dx, dy)) => self.scroll_by(dx, dy),
                None => false,
            },
            CommandId::VIEW_RESET => self.reset_view(),
            CommandId::FILTER_GRAYSCALE => self.apply_filter(FilterKind::Grayscale),
            CommandId::FILTER_SEPIA => self.apply_filter(FilterKind::Sepia),
            CommandId::FILTER_NEGATIVE => self.apply_filter(FilterKind::Negative),
            CommandId::FILTER_NORMAL => self.apply_filter(FilterKind::ResetToSource),
            CommandId::EDIT_UNDO => self.undo(),
            CommandId::EDIT_REDO => self.redo(),
            other => {
                tracing::warn!("Unknown command: {}", other);
                return Err(ViewerError::InvalidCommand(other.to_string()));
            }
        };

        if !applied {
            tracing::debug!("Command {} was a no-op", cmd.id.as_str());
        }
        Ok(applied)
    }
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
