//! Mapping from geographic extent to canvas pixels.

use terrain_common::BoundingBox;

use crate::error::{RenderError, Result};

/// A lon/lat extent drawn onto a `width` x `height` pixel plot area.
///
/// Pixel (0, 0) is the top-left corner, at (min_x, max_y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub extent: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(extent: BoundingBox, width: u32, height: u32) -> Result<Self> {
        if !extent.is_valid() || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(RenderError::invalid_extent(format!("degenerate extent {}", extent)));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::CanvasAllocation { width, height });
        }
        Ok(Self {
            extent,
            width,
            height,
        })
    }

    /// A viewport `width` pixels wide whose height keeps a degree of latitude
    /// `1 / cos(mid latitude)` times taller than a degree of longitude.
    pub fn geographic(extent: BoundingBox, width: u32) -> Result<Self> {
        if !extent.is_valid() || extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(RenderError::invalid_extent(format!("degenerate extent {}", extent)));
        }
        let (_, mid_lat) = extent.center();
        let cos_lat = mid_lat.to_radians().cos().max(0.01);
        let aspect = extent.height() / (extent.width() * cos_lat);
        let height = (width as f64 * aspect).round().max(1.0) as u32;
        Self::new(extent, width, height)
    }

    /// Pixels per degree along x and y.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.width as f64 / self.extent.width(),
            self.height as f64 / self.extent.height(),
        )
    }

    /// Pixel position of (lon, lat); may fall outside the plot area.
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (sx, sy) = self.scale();
        (
            ((lon - self.extent.min_x) * sx) as f32,
            ((self.extent.max_y - lat) * sy) as f32,
        )
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.extent.contains_point(lon, lat)
    }
}
