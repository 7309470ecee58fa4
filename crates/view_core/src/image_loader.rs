//! Image decoding, export and file metadata

use crate::ViewerError;
use chrono::{DateTime, Local};
use image::{ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

pub use view_fs::is_supported_image;

/// Decoded image result
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixels: RgbaImage,
    /// Content hash of the encoded file
    pub hash: u64,
}

/// Read and decode an image file to RGBA8
pub fn load_image(path: &Path) -> Result<LoadedImage, ViewerError> {
    tracing::debug!("Loading image: {}", path.display());

    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ViewerError::FileNotFound(path.display().to_string()),
        std::io::ErrorKind::PermissionDenied => ViewerError::AccessDenied(path.display().to_string()),
        _ => ViewerError::Io(e),
    })?;
    let hash = xxh3_64(&data);

    let pixels = decode_bytes(&data)?;
    Ok(LoadedImage { pixels, hash })
}

/// Decode an in-memory encoded image to RGBA8
pub fn decode_bytes(data: &[u8]) -> Result<RgbaImage, ViewerError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ViewerError::ImageDecode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(ViewerError::UnsupportedFormat("unrecognized image data".into()));
    }

    let img = reader.decode()?;
    Ok(img.to_rgba8())
}

/// Decode and shrink to fit a `size` x `size` box, keeping aspect ratio
pub fn load_thumbnail(path: &Path, size: u32) -> Result<RgbaImage, ViewerError> {
    let data = std::fs::read(path)?;
    let img = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| ViewerError::ImageDecode(e.to_string()))?
        .decode()?;
    Ok(img.thumbnail(size, size).to_rgba8())
}

/// Get image dimensions without fully decoding
pub fn get_image_dimensions(path: &Path) -> Result<(u32, u32), ViewerError> {
    let reader = ImageReader::open(path)?
        .with_guessed_format()
        .map_err(|e| ViewerError::ImageDecode(e.to_string()))?;

    reader.into_dimensions()
        .map_err(|e| ViewerError::ImageDecode(e.to_string()))
}

/// Write `image` to `path`, choosing the encoder from the extension
pub fn export_image(image: &RgbaImage, path: &Path) -> Result<(), ViewerError> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| ViewerError::UnsupportedFormat(path.display().to_string()))?;

    let result = match format {
        // No alpha channel in JPEG
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };

    result.map_err(|e| ViewerError::ImageEncode(e.to_string()))?;
    tracing::info!("Exported {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// File-system and header facts shown in the metadata view
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub file_name: String,
    pub directory: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
    pub format: String,
    pub dimensions: Option<(u32, u32)>,
}

impl ImageMetadata {
    /// Label/value rows in display order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Filename", self.file_name.clone()),
            ("Path", self.directory.clone()),
            ("Size", format!("{:.2} KB", self.size_bytes as f64 / 1024.0)),
        ];
        if let Some(modified) = &self.modified {
            rows.push(("Last Modified", modified.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        rows.push(("Format", self.format.clone()));
        if let Some((w, h)) = self.dimensions {
            rows.push(("Dimensions", format!("{} x {} pixels", w, h)));
        }
        rows
    }
}

/// Collect metadata for an image file
pub fn image_metadata(path: &Path) -> Result<ImageMetadata, ViewerError> {
    let entry = view_fs::FileEntry::from_path(path)?;

    let directory = path
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .or_else(|| path.parent())
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let modified = entry
        .modified
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local));

    Ok(ImageMetadata {
        file_name: entry.name,
        directory,
        size_bytes: entry.size,
        modified,
        format: entry.extension.to_uppercase(),
        dimensions: get_image_dimensions(path).ok(),
    })
}
