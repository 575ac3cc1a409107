//! Per-cell longitude/latitude grids.

use terrain_common::GeoTransform;

use crate::types::CoordinateGrids;

/// Build lon/lat grids for a `rows` x `cols` window with upper-left `transform`.
///
/// Coordinates are taken at the cell's upper-left corner: `lon = c + col * a`,
/// `lat = f - row * |e|`. Longitude is constant down each column and latitude
/// constant along each row.
pub fn build_coordinate_grids(rows: usize, cols: usize, transform: &GeoTransform) -> CoordinateGrids {
    let lons: Vec<f64> = (0..cols)
        .map(|col| transform.c + col as f64 * transform.a)
        .collect();
    let lats: Vec<f64> = (0..rows)
        .map(|row| transform.f - row as f64 * transform.e.abs())
        .collect();

    let mut lon = Vec::with_capacity(rows * cols);
    let mut lat = Vec::with_capacity(rows * cols);
    for &row_lat in &lats {
        lon.extend_from_slice(&lons);
        lat.extend(std::iter::repeat(row_lat).take(cols));
    }

    CoordinateGrids {
        lon,
        lat,
        width: cols,
        height: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_shape_and_corners() {
        let transform = GeoTransform::from_origin(20.0, 48.5, 1.0 / 120.0, 1.0 / 120.0);
        let grids = build_coordinate_grids(600, 1140, &transform);

        assert_eq!(grids.shape(), (600, 1140));
        assert_eq!(grids.lon.len(), 600 * 1140);
        assert_eq!(grids.lon_at(0, 0), Some(20.0));
        assert_eq!(grids.lat_at(0, 0), Some(48.5));
        assert_relative_eq!(grids.lon_at(0, 1139).unwrap(), 20.0 + 1139.0 / 120.0, epsilon = 1e-9);
        assert_relative_eq!(grids.lat_at(599, 0).unwrap(), 48.5 - 599.0 / 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rows_share_latitude_columns_share_longitude() {
        let grids = build_coordinate_grids(3, 4, &GeoTransform::from_origin(0.0, 3.0, 0.5, 1.0));
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(grids.lon_at(row, col), grids.lon_at(0, col));
                assert_eq!(grids.lat_at(row, col), grids.lat_at(row, 0));
            }
        }
        assert_eq!(grids.lat_at(2, 3), Some(1.0));
        assert_eq!(grids.lon_at(2, 3), Some(1.5));
    }

    #[test]
    fn test_empty_window() {
        let grids = build_coordinate_grids(0, 5, &GeoTransform::from_origin(0.0, 0.0, 1.0, 1.0));
        assert!(grids.lon.is_empty());
        assert_eq!(grids.extent(), None);
    }
}
