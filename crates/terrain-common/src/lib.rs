//! Common types and utilities shared across the bear-terrain crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{TerrainError, TerrainResult};
pub use grid::{GeoTransform, PixelWindow, Window};
