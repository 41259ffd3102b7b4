use photo_gallery::{AlbumSource, CollectionConfig, ImageCacheConfig, ImageSize};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Layout of the thumbnail grid, in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: u32,
    pub item_spacing: f64,
    /// Thumbnails are never rendered above this scale
    pub max_display_scale: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            item_spacing: 3.0,
            max_display_scale: 2.0,
        }
    }
}

impl GridLayout {
    /// Width of one square grid item
    pub fn item_width(&self, screen_width: f64) -> f64 {
        let columns = self.columns.max(1) as f64;
        ((screen_width - (columns - 1.0) * self.item_spacing) / columns).max(1.0)
    }

    /// Pixel size to request for grid thumbnails
    pub fn thumbnail_size(&self, screen_width: f64, display_scale: f64) -> ImageSize {
        let side = self.item_width(screen_width);
        ImageSize::scaled(side, side, display_scale.min(self.max_display_scale))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCacheSettings {
    pub request_timeout_ms: u64,
    pub max_cached_images: usize,
}

impl Default for ImageCacheSettings {
    fn default() -> Self {
        let defaults = ImageCacheConfig::default();
        Self {
            request_timeout_ms: defaults.request_timeout.as_millis() as u64,
            max_cached_images: defaults.max_cached_images,
        }
    }
}

/// Application configuration, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// Edge length requested for the full screen photo
    pub detail_image_size: u32,
    pub undo_depth: usize,
    pub grid: GridLayout,
    pub image_cache: ImageCacheSettings,
    pub album: AlbumSource,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            detail_image_size: 1024,
            undo_depth: 1,
            grid: GridLayout::default(),
            image_cache: ImageCacheSettings::default(),
            album: AlbumSource::UserLibrary,
        }
    }
}

impl AppConfig {
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads the config file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log level {:?}, using info", self.log_level);
            log::LevelFilter::Info
        })
    }

    pub fn detail_size(&self) -> ImageSize {
        ImageSize::square(self.detail_image_size)
    }

    pub fn collection_config(&self) -> CollectionConfig {
        CollectionConfig {
            source: self.album.clone(),
            undo_depth: self.undo_depth,
            image_cache: ImageCacheConfig {
                request_timeout: Duration::from_millis(self.image_cache.request_timeout_ms),
                max_cached_images: self.image_cache.max_cached_images,
            },
        }
    }
}
