//! imageview core domain logic
//!
//! This crate contains:
//! - Image store and content filters
//! - View transform (zoom, rotation, flips, pan) and its rendering pipeline
//! - Viewer controller and the generational controller registry
//! - Snapshot-based undo/redo
//! - Gallery index and background thumbnail generation
//! - Image loading and export
//! - Command system
//! - Viewer session (host-facing intents)
//! - Configuration and error types

pub mod config;
pub mod command;
pub mod controller;
pub mod error;
pub mod gallery;
pub mod history;
pub mod image_loader;
pub mod image_store;
pub mod registry;
pub mod session;
pub mod thumbnail_manager;
pub mod view_transform;

pub use config::{AppConfig, GalleryConfig, GeneralConfig, Interpolation, ViewerConfig};
pub use command::{Command, CommandId, CommandParams};
pub use controller::{ViewerController, ViewerState};
pub use error::ViewerError;
pub use gallery::{GalleryEntry, GalleryIndex};
pub use history::{EditKind, UndoCommand, UndoEngine};
pub use image_loader::{
    export_image, get_image_dimensions, image_metadata, is_supported_image, load_image, load_thumbnail,
    ImageMetadata, LoadedImage,
};
pub use image_store::{FilterKind, ImageStore};
pub use registry::{ControllerId, ControllerRegistry};
pub use session::ViewerSession;
pub use thumbnail_manager::{ThumbnailDone, ThumbnailPump};
pub use view_transform::{paint_origin, ViewTransform};
