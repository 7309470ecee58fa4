//! Viewer error types

use thiserror::Error;

/// Main viewer error type
#[derive(Error, Debug)]
pub enum ViewerError {
    // ===== Recoverable Errors (notify user, continue) =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Image encode error: {0}")]
    ImageEncode(String),

    #[error("No image is loaded")]
    NoImage,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // ===== Fatal Errors (application termination) =====
    #[error("System resource exhaustion: {0}")]
    SystemResource(String),
}

impl ViewerError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ViewerError::Io(_)
                | ViewerError::FileNotFound(_)
                | ViewerError::AccessDenied(_)
                | ViewerError::UnsupportedFormat(_)
                | ViewerError::ImageDecode(_)
                | ViewerError::ImageEncode(_)
                | ViewerError::NoImage
                | ViewerError::InvalidCommand(_)
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::FileNotFound(path) => format!("Could not open image file:\n{}", path),
            ViewerError::AccessDenied(path) => format!("Access denied: {}", path),
            ViewerError::UnsupportedFormat(ext) => format!("Unsupported format: {}", ext),
            ViewerError::ImageDecode(msg) => format!("Cannot load image: {}", msg),
            ViewerError::ImageEncode(msg) => format!("Failed to export image: {}", msg),
            ViewerError::NoImage => "No image is loaded.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<view_fs::FsError> for ViewerError {
    fn from(e: view_fs::FsError) -> Self {
        match e {
            view_fs::FsError::NotFound(p) => ViewerError::FileNotFound(p),
            view_fs::FsError::AccessDenied(p) => ViewerError::AccessDenied(p),
            view_fs::FsError::Io(e) => ViewerError::Io(e),
            view_fs::FsError::InvalidPath(p) => ViewerError::FileNotFound(p),
        }
    }
}

impl From<image::ImageError> for ViewerError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(u) => ViewerError::UnsupportedFormat(u.to_string()),
            image::ImageError::IoError(io) => ViewerError::Io(io),
            other => ViewerError::ImageDecode(other.to_string()),
        }
    }
}
