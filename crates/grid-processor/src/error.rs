//! Error types for grid extraction and caching.

use terrain_common::{CrsCode, TerrainError};
use thiserror::Error;

/// Errors that can occur while extracting or caching an elevation grid.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// The boundary file could not be read or parsed.
    #[error("failed to load boundary: {0}")]
    BoundaryLoad(String),

    /// The boundary contains no usable polygon, or a malformed one.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Boundary and raster CRSs differ and no reprojection was done.
    #[error("CRS mismatch: expected {expected}, got {actual}")]
    CrsMismatch { expected: CrsCode, actual: CrsCode },

    /// A CRS the pipeline cannot work in.
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// The raster could not be opened or decoded.
    #[error("failed to read raster: {0}")]
    RasterRead(String),

    /// The requested window does not overlap the raster.
    #[error("window out of bounds: {0}")]
    WindowOutOfBounds(String),

    /// Arrays that must share a shape do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Invalid metadata in the cache artifact.
    #[error("invalid cache metadata: {0}")]
    InvalidMetadata(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Point reprojection failed.
    #[error("projection error: {0}")]
    Projection(#[from] projection::ProjectionError),
}

impl GridProcessorError {
    /// Create a BoundaryLoad error.
    pub fn boundary_load(msg: impl Into<String>) -> Self {
        Self::BoundaryLoad(msg.into())
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a RasterRead error.
    pub fn raster_read(msg: impl Into<String>) -> Self {
        Self::RasterRead(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    /// Create a ConfigError.
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<TerrainError> for GridProcessorError {
    fn from(err: TerrainError) -> Self {
        match err {
            TerrainError::WindowOutOfBounds { .. } => Self::WindowOutOfBounds(err.to_string()),
            TerrainError::ShapeMismatch { expected, actual } => {
                Self::ShapeMismatch { expected, actual }
            }
            TerrainError::InvalidBbox(msg) => Self::InvalidGeometry(msg),
            TerrainError::InvalidCrs(msg) => Self::ConfigError(msg),
            TerrainError::InvalidTransform(msg) => Self::RasterRead(msg),
        }
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<tiff::TiffError> for GridProcessorError {
    fn from(err: tiff::TiffError) -> Self {
        Self::RasterRead(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidMetadata(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
