//! Application configuration.
//!
//! Values are resolved with the following priority (highest to lowest):
//! 1. Environment variables (METAVIEW_*)
//! 2. Config file (<config dir>/metaview/config.toml)
//! 3. Default values

use serde::Deserialize;
use std::path::PathBuf;

/// Supported image file extensions for scanning directories.
///
/// Directory listings are grouped by extension in this order, each group
/// sorted by file name.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tiff", "tif"];

/// Default number of neighbors pre-warmed on each side of the current image.
pub const DEFAULT_WINDOW_RADIUS: usize = 25;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of decoded thumbnails held in memory. 0 disables caching.
    pub cache_capacity: usize,
    /// How many neighbors on each side of the current image to pre-warm.
    pub window_radius: usize,
    /// Minimum movement from the last planned center before the window is
    /// recomputed.
    pub replan_threshold: usize,
    /// Longest edge of a decoded thumbnail in pixels. Smaller images are
    /// never upscaled.
    pub max_dimension: u32,
    /// JPEG quality for re-encoded thumbnails (1-100).
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 2 * DEFAULT_WINDOW_RADIUS + 1,
            window_radius: DEFAULT_WINDOW_RADIUS,
            replan_threshold: 10,
            max_dimension: 1920,
            jpeg_quality: 60,
        }
    }
}

impl Config {
    /// Load config with priority: env vars > config file > defaults.
    pub fn load() -> Self {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides();
        config.clamp_values();
        config
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("metaview").join("config.toml"))
    }

    fn load_from_file() -> Option<Self> {
        let path = Self::config_path()?;
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = Self::parse_env::<usize>("METAVIEW_CACHE_CAPACITY") {
            self.cache_capacity = v;
        }
        if let Some(v) = Self::parse_env::<usize>("METAVIEW_WINDOW_RADIUS") {
            self.window_radius = v;
        }
        if let Some(v) = Self::parse_env::<usize>("METAVIEW_REPLAN_THRESHOLD") {
            self.replan_threshold = v;
        }
        if let Some(v) = Self::parse_env::<u32>("METAVIEW_MAX_DIMENSION") {
            self.max_dimension = v;
        }
        if let Some(v) = Self::parse_env::<u8>("METAVIEW_JPEG_QUALITY") {
            self.jpeg_quality = v;
        }
    }

    fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
        std::env::var(name).ok()?.parse().ok()
    }

    fn clamp_values(&mut self) {
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.max_dimension = self.max_dimension.max(16);
        self.replan_threshold = self.replan_threshold.max(1);
    }
}
