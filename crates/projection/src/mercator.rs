//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Latitude limit where the Web Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self { radius: 6_378_137.0 }
    }
}

impl WebMercator {
    /// (lon, lat) degrees to (x, y) meters. Latitude is clamped to the square.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = self.radius * lon_deg.to_radians();
        let y = self.radius * (FRAC_PI_4 + lat / 2.0).tan().ln();
        (x, y)
    }

    /// (x, y) meters to (lon, lat) degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - FRAC_PI_2).to_degrees();
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_edges() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(180.0, MAX_LATITUDE);
        assert!((x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!((y - 20_037_508.342_789_244).abs() < 1e-3);
    }

    #[test]
    fn test_roundtrip() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(26.1, 44.43);
        let (lon, lat) = merc.inverse(x, y);
        assert!((lon - 26.1).abs() < 1e-10);
        assert!((lat - 44.43).abs() < 1e-10);
    }
}
