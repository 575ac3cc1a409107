//! Error types shared by the bear-terrain crates.

use thiserror::Error;

/// Result type alias using TerrainError.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Errors raised by the shared geometry types.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid affine transform: {0}")]
    InvalidTransform(String),

    #[error("Window {window} does not overlap a {width}x{height} raster")]
    WindowOutOfBounds {
        window: String,
        width: usize,
        height: usize,
    },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl From<crate::crs::CrsParseError> for TerrainError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        TerrainError::InvalidCrs(err.to_string())
    }
}

impl From<crate::bbox::BboxParseError> for TerrainError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        TerrainError::InvalidBbox(err.to_string())
    }
}
