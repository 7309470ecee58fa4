//! Application configuration

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub viewer: ViewerConfig,
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub dark_mode: bool,
    /// Directory opened at startup when no path is given
    pub default_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub interpolation: Interpolation,
    /// Factor applied by zoom in / zoom out
    pub zoom_step: f64,
    /// Fit the image to the viewport when it is opened
    pub fit_on_open: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            zoom_step: 1.2,
            fit_on_open: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Longest edge of a generated thumbnail
    pub thumbnail_size: u32,
    /// Worker threads for thumbnail generation (0 = one per core)
    pub thumbnail_threads: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 128,
            thumbnail_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[serde(rename = "nearest")]
    Nearest,
    #[default]
    #[serde(rename = "bilinear")]
    Bilinear,
    #[serde(rename = "lanczos3")]
    Lanczos3,
}

impl Interpolation {
    /// Resize filter used when scaling
    pub fn filter_type(self) -> image::imageops::FilterType {
        match self {
            Interpolation::Nearest => image::imageops::FilterType::Nearest,
            Interpolation::Bilinear => image::imageops::FilterType::Triangle,
            Interpolation::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", config_path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        tracing::info!("Configuration saved to {:?}", config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("org", "imageview", "imageview")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Directory to open at startup: configured, then Pictures, then home
    pub fn startup_directory(&self) -> PathBuf {
        if let Some(dir) = &self.general.default_directory {
            if dir.is_dir() {
                return dir.clone();
            }
        }

        let user_dirs = UserDirs::new();
        user_dirs
            .as_ref()
            .and_then(|dirs| dirs.picture_dir())
            .filter(|p| p.is_dir())
            .map(Path::to_path_buf)
            .or_else(|| user_dirs.as_ref().map(|dirs| dirs.home_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(!config.general.dark_mode);
        assert_eq!(config.viewer.zoom_step, 1.2);
        assert_eq!(config.gallery.thumbnail_size, 128);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            "[general]\ndark_mode = true\ndefault_directory = \"/srv/photos\"\n\n[viewer]\ninterpolation = \"lanczos3\"\n",
        )
        .unwrap();
        assert!(config.general.dark_mode);
        assert_eq!(config.general.default_directory, Some(PathBuf::from("/srv/photos")));
        assert_eq!(config.viewer.interpolation, Interpolation::Lanczos3);
        assert!(config.viewer.fit_on_open);
        assert_eq!(config.gallery, GalleryConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.general.dark_mode = true;
        config.gallery.thumbnail_size = 256;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_startup_directory_prefers_configured() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.general.default_directory = Some(temp_dir.path().to_path_buf());
        assert_eq!(config.startup_directory(), temp_dir.path());
    }
}
