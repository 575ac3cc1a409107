//! Core types for grid extraction.

use terrain_common::{BoundingBox, GeoTransform};

use crate::error::{GridProcessorError, Result};

/// A clipped elevation grid.
///
/// Values are meters, row-major from the north-west corner. Missing cells
/// (raster nodata or outside the mask) are NaN; 0.0 is sea level.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// Transform of the clipped window.
    pub transform: GeoTransform,
}

impl ElevationGrid {
    /// Create a grid, checking that `data` holds `width * height` values.
    pub fn new(data: Vec<f32>, width: usize, height: usize, transform: GeoTransform) -> Result<Self> {
        if data.len() != width * height {
            return Err(GridProcessorError::ShapeMismatch {
                expected: (height, width),
                actual: (data.len() / width.max(1), width),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
        })
    }

    /// Convert raw raster samples, turning every `nodata` sample into NaN.
    ///
    /// Samples that are already NaN stay NaN. No other sample changes.
    pub fn from_samples(
        samples: &[f64],
        nodata: Option<f64>,
        width: usize,
        height: usize,
        transform: GeoTransform,
    ) -> Result<Self> {
        let data = samples
            .iter()
            .map(|&v| match nodata {
                Some(nd) if v == nd => f32::NAN,
                _ => v as f32,
            })
            .collect();
        Self::new(data, width, height, transform)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Raw value at (row, col), NaN included.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Elevation at (row, col), `None` for missing or out-of-range cells.
    pub fn elevation(&self, row: usize, col: usize) -> Option<f32> {
        self.get(row, col).filter(|v| !v.is_nan())
    }

    pub fn missing_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Min and max over valid cells.
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        finite_range(&self.data)
    }

    /// Map-space extent covered by the grid cells.
    pub fn extent(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Min and max over the non-NaN values of a slice.
pub fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Per-cell longitude and latitude, index-aligned with an [`ElevationGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrids {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

impl CoordinateGrids {
    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn lon_at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.lon.get(row * self.width + col).copied()
    }

    pub fn lat_at(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.lat.get(row * self.width + col).copied()
    }

    /// Min/max of the coordinate arrays, as a box.
    pub fn extent(&self) -> Option<BoundingBox> {
        coordinate_extent(&self.lon, &self.lat)
    }

    /// Error unless these grids match `grid` cell for cell.
    pub fn check_aligned(&self, grid: &ElevationGrid) -> Result<()> {
        let expected = grid.shape();
        for actual in [
            self.shape(),
            (self.lon.len() / self.width.max(1), self.width),
            (self.lat.len() / self.width.max(1), self.width),
        ] {
            if actual != expected {
                return Err(GridProcessorError::ShapeMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

/// Bounding box over parallel lon/lat arrays, skipping non-finite values.
pub fn coordinate_extent(lon: &[f64], lat: &[f64]) -> Option<BoundingBox> {
    BoundingBox::from_points(lon.iter().copied().zip(lat.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> GeoTransform {
        GeoTransform::from_origin(20.0, 48.0, 0.5, 0.5)
    }

    #[test]
    fn test_from_samples_masks_only_nodata() {
        let samples = [-32768.0, 0.0, 12.0, -32768.0, 2500.0, -1.0];
        let grid = ElevationGrid::from_samples(&samples, Some(-32768.0), 3, 2, transform()).unwrap();

        assert!(grid.get(0, 0).unwrap().is_nan());
        assert_eq!(grid.get(0, 1), Some(0.0));
        assert_eq!(grid.elevation(1, 2), Some(-1.0));
        assert_eq!(grid.elevation(1, 0), None);
        assert_eq!(grid.missing_count(), 2);
    }

    #[test]
    fn test_from_samples_without_nodata_keeps_values() {
        let samples = [-32768.0, 5.0];
        let grid = ElevationGrid::from_samples(&samples, None, 2, 1, transform()).unwrap();
        assert_eq!(grid.missing_count(), 0);
        assert_eq!(grid.get(0, 0), Some(-32768.0));
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = ElevationGrid::new(vec![0.0; 5], 3, 2, transform());
        assert!(matches!(result, Err(GridProcessorError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_finite_range_ignores_nan() {
        assert_eq!(finite_range(&[f32::NAN, 3.0, -2.0, 10.0]), Some((-2.0, 10.0)));
        assert_eq!(finite_range(&[f32::NAN]), None);
    }

    #[test]
    fn test_extent() {
        let grid = ElevationGrid::new(vec![0.0; 6], 3, 2, transform()).unwrap();
        assert_eq!(grid.extent(), BoundingBox::new(20.0, 47.0, 21.5, 48.0));
    }
}
