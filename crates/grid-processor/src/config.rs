//! Configuration for elevation extraction and the grid cache.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use terrain_common::{BoundingBox, CrsCode};

// ============================================================================
// Cache Configuration
// ============================================================================

/// Configuration for the Zarr grid cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Chunk dimension for Zarr arrays (square chunks).
    pub zarr_chunk_size: usize,

    /// Compression codec for Zarr arrays.
    pub zarr_compression: ZarrCompression,

    /// Compression level (1-9). Ignored without compression.
    pub zarr_compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub zarr_shuffle: bool,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            zarr_chunk_size: 512,
            zarr_compression: ZarrCompression::None,
            zarr_compression_level: 5,
            zarr_shuffle: true,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Override fields with any cache variables present in the environment.
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("ZARR_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                self.zarr_chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("CACHE_COMPRESSION") {
            self.zarr_compression = ZarrCompression::from_str(&val);
        }

        if let Ok(val) = std::env::var("ZARR_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                self.zarr_compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("ZARR_SHUFFLE") {
            self.zarr_shuffle = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.zarr_chunk_size == 0 {
            return Err("zarr_chunk_size must be > 0".to_string());
        }

        if self.zarr_compression != ZarrCompression::None
            && (self.zarr_compression_level == 0 || self.zarr_compression_level > 9)
        {
            return Err("zarr_compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for Zarr arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZarrCompression {
    /// No compression.
    #[default]
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd.
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive). Unknown names mean no compression.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lz4" | "blosc_lz4" => Self::BloscLz4,
            "zstd" | "blosc_zstd" => Self::BloscZstd,
            _ => Self::None,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Extraction Configuration
// ============================================================================

/// How the raster is restricted to the region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipMode {
    /// Rectangular read of the boundary's bounding box.
    #[default]
    Bbox,
    /// Crop to the boundary extent and blank cells outside the polygons.
    Mask,
}

impl ClipMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bbox" | "bounding-box" | "bounding_box" => Some(Self::Bbox),
            "mask" | "exact-mask" | "exact_mask" => Some(Self::Mask),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bbox => "bbox",
            Self::Mask => "mask",
        }
    }

    /// Cache location used when none is configured.
    pub fn default_cache_path(&self) -> PathBuf {
        match self {
            Self::Bbox => PathBuf::from("../data/bears_elevation_grid.zarr"),
            Self::Mask => PathBuf::from("../data/romania_elevation_grid.zarr"),
        }
    }
}

impl std::fmt::Display for ClipMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs, outputs and options of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Vector boundary (GeoJSON).
    pub boundary_path: PathBuf,

    /// Global elevation raster (GeoTIFF).
    pub raster_path: PathBuf,

    /// Output cache artifact. Defaults per clip mode when unset.
    pub cache_path: Option<PathBuf>,

    /// CRS the boundary is reprojected to. Must match the raster.
    pub target_crs: CrsCode,

    pub clip_mode: ClipMode,

    /// Explicit box used instead of the boundary extent in bbox mode.
    pub bbox: Option<BoundingBox>,

    pub cache: GridProcessorConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            boundary_path: PathBuf::from("../data/gadm41_ROU_0.json"),
            raster_path: PathBuf::from("../data/wc2.1_30s_elev.tif"),
            cache_path: None,
            target_crs: CrsCode::Epsg4326,
            clip_mode: ClipMode::Bbox,
            bbox: None,
            cache: GridProcessorConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Override fields with any extraction variables present in the environment.
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("BOUNDARY_PATH") {
            self.boundary_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("RASTER_PATH") {
            self.raster_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CACHE_PATH") {
            self.cache_path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("CLIP_MODE") {
            if let Some(mode) = ClipMode::parse(&val) {
                self.clip_mode = mode;
            }
        }

        self.cache.merge_env();
    }

    /// The cache artifact path, explicit or the clip mode's default.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path
            .clone()
            .unwrap_or_else(|| self.clip_mode.default_cache_path())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.boundary_path.as_os_str().is_empty() {
            return Err("boundary_path must be set".to_string());
        }

        if self.raster_path.as_os_str().is_empty() {
            return Err("raster_path must be set".to_string());
        }

        if let Some(bbox) = &self.bbox {
            if !bbox.is_valid() {
                return Err(format!("bbox {} must have min < max on both axes", bbox));
            }
            if self.clip_mode == ClipMode::Mask {
                return Err("an explicit bbox only applies to bbox clip mode".to_string());
            }
        }

        self.cache.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridProcessorConfig::default();
        assert_eq!(config.zarr_chunk_size, 512);
        assert_eq!(config.zarr_compression, ZarrCompression::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GridProcessorConfig::default();
        config.zarr_chunk_size = 0;
        assert!(config.validate().is_err());

        config = GridProcessorConfig {
            zarr_compression: ZarrCompression::BloscZstd,
            zarr_compression_level: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.zarr_compression_level = 10;
        assert!(config.validate().is_err());

        config.zarr_compression_level = 3;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zarr_compression_from_str() {
        assert_eq!(ZarrCompression::from_str("none"), ZarrCompression::None);
        assert_eq!(ZarrCompression::from_str("lz4"), ZarrCompression::BloscLz4);
        assert_eq!(
            ZarrCompression::from_str("BLOSC_ZSTD"),
            ZarrCompression::BloscZstd
        );
        assert_eq!(ZarrCompression::from_str("invalid"), ZarrCompression::None);
    }

    #[test]
    fn test_clip_mode_parse() {
        assert_eq!(ClipMode::parse("bbox"), Some(ClipMode::Bbox));
        assert_eq!(ClipMode::parse(" Exact-Mask "), Some(ClipMode::Mask));
        assert_eq!(ClipMode::parse("circle"), None);
    }

    #[test]
    fn test_cache_path_defaults_per_mode() {
        let mut config = ExtractionConfig::default();
        assert!(config.cache_path().ends_with("bears_elevation_grid.zarr"));

        config.clip_mode = ClipMode::Mask;
        assert!(config.cache_path().ends_with("romania_elevation_grid.zarr"));

        config.cache_path = Some(PathBuf::from("/tmp/out.zarr"));
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/out.zarr"));
    }

    #[test]
    fn test_bbox_override_rejected_in_mask_mode() {
        let config = ExtractionConfig {
            clip_mode: ClipMode::Mask,
            bbox: Some(BoundingBox::new(20.0, 43.5, 29.5, 48.5)),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{"clip_mode": "mask", "target_crs": "EPSG:4326"}"#).unwrap();
        assert_eq!(config.clip_mode, ClipMode::Mask);
        assert_eq!(config.raster_path, PathBuf::from("../data/wc2.1_30s_elev.tif"));
    }
}
