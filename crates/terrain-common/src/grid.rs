//! Affine geotransforms and raster windows.
//!
//! Transforms use the GDAL/rasterio coefficient order `(a, b, c, d, e, f)`:
//!
//! ```text
//! x = c + col * a + row * b
//! y = f + col * d + row * e
//! ```
//!
//! North-up rasters have `b = d = 0` and a negative `e` (rows go south).

use crate::{BoundingBox, TerrainError, TerrainResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Values closer than this to an integer are treated as that integer when
/// rounding windows. Absorbs the error in pixel sizes like 1/120 degree.
const WINDOW_SNAP_EPSILON: f64 = 1e-6;

/// Affine transform mapping (row, col) pixel corners to map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform from the upper-left corner and pixel sizes.
    pub fn from_origin(west: f64, north: f64, x_size: f64, y_size: f64) -> Self {
        Self::new(x_size, 0.0, west, 0.0, -y_size, north)
    }

    /// Build from `[a, b, c, d, e, f]`.
    pub fn from_array(values: [f64; 6]) -> Self {
        Self::new(values[0], values[1], values[2], values[3], values[4], values[5])
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Upper-left corner (x, y) of pixel (0, 0).
    pub fn origin(&self) -> (f64, f64) {
        (self.c, self.f)
    }

    /// Pixel width (x step per column).
    pub fn pixel_width(&self) -> f64 {
        self.a
    }

    /// Magnitude of the pixel height (y step per row is `-pixel_height()` when north-up).
    pub fn pixel_height(&self) -> f64 {
        self.e.abs()
    }

    pub fn is_north_up(&self) -> bool {
        self.b == 0.0 && self.d == 0.0 && self.a > 0.0 && self.e < 0.0
    }

    /// Error unless this is a north-up transform.
    pub fn require_north_up(&self) -> TerrainResult<()> {
        if self.is_north_up() {
            Ok(())
        } else {
            Err(TerrainError::InvalidTransform(format!(
                "expected north-up transform (b = d = 0, a > 0, e < 0), got {:?}",
                self.to_array()
            )))
        }
    }

    /// Map coordinates of the upper-left corner of pixel (row, col).
    pub fn xy(&self, row: f64, col: f64) -> (f64, f64) {
        (
            self.c + col * self.a + row * self.b,
            self.f + col * self.d + row * self.e,
        )
    }

    /// Fractional (row, col) of a map coordinate.
    pub fn rowcol(&self, x: f64, y: f64) -> TerrainResult<(f64, f64)> {
        let det = self.a * self.e - self.b * self.d;
        if det == 0.0 || !det.is_finite() {
            return Err(TerrainError::InvalidTransform(format!(
                "transform {:?} is not invertible",
                self.to_array()
            )));
        }
        let dx = x - self.c;
        let dy = y - self.f;
        let col = (self.e * dx - self.b * dy) / det;
        let row = (self.a * dy - self.d * dx) / det;
        Ok((row, col))
    }

    /// Transform of a sub-window whose upper-left pixel is (row_off, col_off).
    pub fn window_transform(&self, window: &PixelWindow) -> GeoTransform {
        let (c, f) = self.xy(window.row_off as f64, window.col_off as f64);
        GeoTransform { c, f, ..*self }
    }

    /// Map-space bounds of a `width` x `height` raster.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.xy(0.0, 0.0),
            self.xy(0.0, width as f64),
            self.xy(height as f64, 0.0),
            self.xy(height as f64, width as f64),
        ];
        BoundingBox::from_points(corners).unwrap_or_else(BoundingBox::empty)
    }
}

/// A fractional pixel-space window, as produced by bounds-to-window math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub col_off: f64,
    pub row_off: f64,
    pub width: f64,
    pub height: f64,
}

impl Window {
    /// Window covering `bbox` under `transform`.
    ///
    /// All four corners are mapped to pixel space and the window spans their
    /// min/max, so it is valid for any transform orientation.
    pub fn from_bounds(bbox: &BoundingBox, transform: &GeoTransform) -> TerrainResult<Self> {
        if !bbox.is_valid() {
            return Err(TerrainError::InvalidBbox(bbox.to_string()));
        }

        let corners = [
            (bbox.min_x, bbox.max_y),
            (bbox.max_x, bbox.max_y),
            (bbox.max_x, bbox.min_y),
            (bbox.min_x, bbox.min_y),
        ];

        let mut min_row = f64::INFINITY;
        let mut max_row = f64::NEG_INFINITY;
        let mut min_col = f64::INFINITY;
        let mut max_col = f64::NEG_INFINITY;
        for (x, y) in corners {
            let (row, col) = transform.rowcol(x, y)?;
            min_row = min_row.min(row);
            max_row = max_row.max(row);
            min_col = min_col.min(col);
            max_col = max_col.max(col);
        }

        Ok(Self {
            col_off: min_col,
            row_off: min_row,
            width: (max_col - min_col).max(0.0),
            height: (max_row - min_row).max(0.0),
        })
    }

    /// Offsets floored, lengths rounded to the nearest pixel.
    ///
    /// Keeps the requested size, which is what a rectangular read wants.
    pub fn round_nearest(&self) -> PixelWindow {
        PixelWindow {
            col_off: snap(self.col_off).floor() as i64,
            row_off: snap(self.row_off).floor() as i64,
            width: snap(self.width).round().max(0.0) as usize,
            height: snap(self.height).round().max(0.0) as usize,
        }
    }

    /// Smallest whole-pixel window containing this one.
    pub fn round_outward(&self) -> PixelWindow {
        let col_start = snap(self.col_off).floor();
        let row_start = snap(self.row_off).floor();
        let col_stop = snap(self.col_off + self.width).ceil();
        let row_stop = snap(self.row_off + self.height).ceil();
        PixelWindow {
            col_off: col_start as i64,
            row_off: row_start as i64,
            width: (col_stop - col_start).max(0.0) as usize,
            height: (row_stop - row_start).max(0.0) as usize,
        }
    }
}

fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < WINDOW_SNAP_EPSILON {
        r
    } else {
        v
    }
}

/// A whole-pixel window. Offsets may be negative until clamped to a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col_off: i64,
    pub row_off: i64,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new(col_off: i64, row_off: i64, width: usize, height: usize) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Intersect with a `raster_width` x `raster_height` raster.
    pub fn clamp_to(&self, raster_width: usize, raster_height: usize) -> TerrainResult<Self> {
        let col_start = self.col_off.max(0);
        let row_start = self.row_off.max(0);
        let col_stop = (self.col_off + self.width as i64).min(raster_width as i64);
        let row_stop = (self.row_off + self.height as i64).min(raster_height as i64);

        if col_stop <= col_start || row_stop <= row_start {
            return Err(TerrainError::WindowOutOfBounds {
                window: format!("{:?}", self),
                width: raster_width,
                height: raster_height,
            });
        }

        Ok(Self {
            col_off: col_start,
            row_off: row_start,
            width: (col_stop - col_start) as usize,
            height: (row_stop - row_start) as usize,
        })
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Column indices covered. Only meaningful after `clamp_to`.
    pub fn col_range(&self) -> Range<usize> {
        let start = self.col_off.max(0) as usize;
        start..start + self.width
    }

    /// Row indices covered. Only meaningful after `clamp_to`.
    pub fn row_range(&self) -> Range<usize> {
        let start = self.row_off.max(0) as usize;
        start..start + self.height
    }
}
