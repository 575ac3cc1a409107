//! Error types for map rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while rendering a map.
#[derive(Error, Debug)]
pub enum RenderError {
    /// tiny-skia refused the canvas size.
    #[error("Cannot allocate a {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    /// A geographic extent cannot be mapped to pixels.
    #[error("Invalid extent: {0}")]
    InvalidExtent(String),

    /// Layer values do not match the stated dimensions.
    #[error("Layer shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),

    /// The output image could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub fn invalid_extent(msg: impl Into<String>) -> Self {
        Self::InvalidExtent(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
