//! bear-maps configuration.
//!
//! Built-in defaults match the `../data` and `../images` layout. A YAML file
//! overrides them, environment variables override the file and command-line
//! flags override everything.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_processor::ExtractionConfig;
use renderer::MapStyle;
use serde::{Deserialize, Serialize};
use tracking::TrackingConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extract: ExtractionConfig,
    pub tracking: TrackingConfig,
    pub render: RenderConfig,
}

/// Where maps read their background from and write their images to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Cache artifact to draw. Defaults to the extraction output.
    pub cache_path: Option<PathBuf>,

    /// Output directory for all images.
    pub images_dir: PathBuf,

    pub style: MapStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            images_dir: PathBuf::from("../images"),
            style: MapStyle::default(),
        }
    }
}

impl RenderConfig {
    /// Override fields with any render variables present in the environment.
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("IMAGES_DIR") {
            self.images_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("MAP_WIDTH") {
            if let Ok(width) = val.parse() {
                self.style.width = width;
            }
        }
    }

    /// Output of the map with every bear.
    pub fn all_bears_path(&self) -> PathBuf {
        self.images_dir.join("all_bears_height_map.png")
    }

    /// Directory for per-bear track maps.
    pub fn tracks_dir(&self) -> PathBuf {
        self.images_dir.join("bear_tracks")
    }
}

impl AppConfig {
    /// Defaults, then `path` when given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.merge_env();
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn merge_env(&mut self) {
        self.extract.merge_env();
        self.tracking.merge_env();
        self.render.merge_env();
    }

    /// Cache the maps read: the render override or the extraction output.
    pub fn map_cache_path(&self) -> PathBuf {
        self.render
            .cache_path
            .clone()
            .unwrap_or_else(|| self.extract.cache_path())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.extract
            .validate()
            .map_err(|e| format!("extract: {}", e))?;
        self.tracking
            .validate()
            .map_err(|e| format!("tracking: {}", e))?;
        self.render
            .style
            .validate()
            .map_err(|e| format!("render.style: {}", e))?;
        if self.render.images_dir.as_os_str().is_empty() {
            return Err("render.images_dir must be set".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::ClipMode;

    #[test]
    fn test_default_config_matches_data_layout() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.map_cache_path(),
            PathBuf::from("../data/bears_elevation_grid.zarr")
        );
        assert_eq!(
            config.render.all_bears_path(),
            PathBuf::from("../images/all_bears_height_map.png")
        );
        assert_eq!(config.render.tracks_dir(), PathBuf::from("../images/bear_tracks"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
extract:
  clip_mode: mask
  raster_path: /data/wc2.1_30s_elev.tif
render:
  images_dir: /tmp/maps
  style:
    width: 900
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.extract.clip_mode, ClipMode::Mask);
        assert_eq!(config.extract.raster_path, PathBuf::from("/data/wc2.1_30s_elev.tif"));
        assert_eq!(
            config.map_cache_path(),
            PathBuf::from("../data/romania_elevation_grid.zarr")
        );
        assert_eq!(config.render.style.width, 900);
        assert_eq!(config.render.style.elevation_alpha, 0.5);
        assert!(config.tracking.csv_path.ends_with("1_bears_RO.csv"));
    }

    #[test]
    fn test_render_cache_override() {
        let yaml = "render:\n  cache_path: /tmp/other.zarr\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.map_cache_path(), PathBuf::from("/tmp/other.zarr"));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.yaml"));
    }

    #[test]
    fn test_invalid_style_rejected() {
        let yaml = "render:\n  style:\n    elevation_alpha: 2.0\n";
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("render.style"), "{}", err);
    }
}
