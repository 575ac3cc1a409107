//! Common test fixtures for bear-terrain tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios in the elevation and tracking pipeline.

/// Common bounding box definitions for testing, as (min_x, min_y, max_x, max_y).
pub mod bbox {
    /// The box the bear maps are cut to
    pub const ROMANIA: (f64, f64, f64, f64) = (20.0, 43.5, 29.5, 48.5);
}

/// Common grid definitions for testing.
pub mod grid {
    /// Small synthetic raster around Romania, 0.1 degree cells
    pub const ROMANIA_TENTH_DEGREE: GridSpec = GridSpec {
        width: 120,
        height: 70,
        min_lon: 19.0,
        max_lon: 31.0,
        min_lat: 42.5,
        max_lat: 49.5,
    };

    /// Grid definition for testing.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub width: usize,
        pub height: usize,
        pub min_lon: f64,
        pub max_lon: f64,
        pub min_lat: f64,
        pub max_lat: f64,
    }

    impl GridSpec {
        /// Cell size in degrees along (lon, lat).
        pub fn resolution(&self) -> (f64, f64) {
            let dx = (self.max_lon - self.min_lon) / self.width as f64;
            let dy = (self.max_lat - self.min_lat) / self.height as f64;
            (dx, dy)
        }
    }
}

/// GeoJSON boundary documents.
pub mod geojson {
    /// A FeatureCollection with one rectangular Polygon feature.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [{{"type": "Feature",
                "properties": {{"GID_0": "TST", "COUNTRY": "Testland"}},
                "geometry": {{"type": "Polygon", "coordinates": [[
                    [{min_x}, {min_y}], [{max_x}, {min_y}], [{max_x}, {max_y}],
                    [{min_x}, {max_y}], [{min_x}, {min_y}]
                ]]}}}}]}}"#
        )
    }

    /// A FeatureCollection with one diamond-shaped Polygon inscribed in the box.
    pub fn diamond(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> String {
        let cx = (min_x + max_x) / 2.0;
        let cy = (min_y + max_y) / 2.0;
        format!(
            r#"{{"type": "FeatureCollection", "features": [{{"type": "Feature",
                "properties": {{"GID_0": "TST"}},
                "geometry": {{"type": "MultiPolygon", "coordinates": [[[
                    [{cx}, {min_y}], [{max_x}, {cy}], [{cx}, {max_y}],
                    [{min_x}, {cy}], [{cx}, {min_y}]
                ]]]}}}}]}}"#
        )
    }
}

/// Bear telemetry CSV documents.
pub mod tracking {
    /// Three fixes for two bears in Stereo70 (EPSG:3844), out of order.
    ///
    /// `Ursu` appears first; its fixes are listed newest first.
    pub const BEARS_CSV: &str = "\
ID,X,Y,Name,timestamp,Sex
1,545000.0,520000.0,Ursu,2021-06-03 08:00:00,M
2,500000.0,500000.0,Martina,2021-06-01 12:30:00,F
3,540000.0,515000.0,Ursu,2021-06-01 06:00:00,M
4,505000.0,498000.0,Martina,2021-06-02 12:30:00,F
5,542000.0,518000.0,Ursu,2021-06-02 07:15:00,M
";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_spec_resolution() {
        let (dx, dy) = grid::ROMANIA_TENTH_DEGREE.resolution();
        assert!((dx - 0.1).abs() < 1e-9);
        assert!((dy - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_geojson_rectangle_is_closed() {
        let json = geojson::rectangle(20.0, 43.5, 29.5, 48.5);
        assert!(json.contains("\"Polygon\""));
        assert!(json.contains("[20, 43.5]"));
    }
}
