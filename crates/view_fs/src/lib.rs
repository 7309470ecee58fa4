//! imageview File System Layer
//!
//! Provides directory listing for the gallery:
//! - Supported image extension detection
//! - Lexicographically ordered image listings
//! - File entry metadata

mod browser;

pub use browser::{FileEntry, list_images, is_supported_image, SUPPORTED_EXTENSIONS};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
