//! Point transforms between the supported CRSs.
//!
//! Every transform goes through WGS84 geographic. Geographic coordinates are
//! always (lon, lat) in degrees.

use crate::ellipsoid::Ellipsoid;
use crate::helmert::Helmert;
use crate::mercator::WebMercator;
use crate::stereographic::ObliqueStereographic;
use crate::ProjectionResult;
use terrain_common::CrsCode;

/// A reusable transform between two CRSs.
#[derive(Debug, Clone)]
pub struct Transformer {
    from: CrsCode,
    to: CrsCode,
    stereo70: ObliqueStereographic,
    datum: Helmert,
    mercator: WebMercator,
}

impl Transformer {
    pub fn new(from: CrsCode, to: CrsCode) -> Self {
        Self {
            from,
            to,
            stereo70: ObliqueStereographic::stereo70(),
            datum: Helmert::STEREO70_TO_WGS84,
            mercator: WebMercator::default(),
        }
    }

    pub fn source(&self) -> CrsCode {
        self.from
    }

    pub fn target(&self) -> CrsCode {
        self.to
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Transform one (x, y) pair.
    pub fn transform(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.to_wgs84(self.from, x, y)?;
        self.from_wgs84(self.to, lon, lat)
    }

    /// Transform a slice of (x, y) pairs in place.
    pub fn transform_in_place(&self, points: &mut [(f64, f64)]) -> ProjectionResult<()> {
        if self.is_identity() {
            return Ok(());
        }
        for p in points.iter_mut() {
            *p = self.transform(p.0, p.1)?;
        }
        Ok(())
    }

    fn to_wgs84(&self, crs: CrsCode, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        match crs {
            CrsCode::Epsg4326 => Ok((x, y)),
            CrsCode::Epsg3857 => Ok(self.mercator.inverse(x, y)),
            CrsCode::Epsg3844 => {
                let (lon, lat) = self.stereo70.inverse(x, y)?;
                let local = Ellipsoid::KRASSOWSKY_1940.geodetic_to_ecef(lon, lat, 0.0);
                let wgs = self.datum.apply(&local);
                let (lon, lat, _) = Ellipsoid::WGS84.ecef_to_geodetic(&wgs);
                Ok((lon, lat))
            }
        }
    }

    fn from_wgs84(&self, crs: CrsCode, lon: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        match crs {
            CrsCode::Epsg4326 => Ok((lon, lat)),
            CrsCode::Epsg3857 => Ok(self.mercator.forward(lon, lat)),
            CrsCode::Epsg3844 => {
                let wgs = Ellipsoid::WGS84.geodetic_to_ecef(lon, lat, 0.0);
                let local = self.datum.apply_inverse(&wgs)?;
                let (lon, lat, _) = Ellipsoid::KRASSOWSKY_1940.ecef_to_geodetic(&local);
                self.stereo70.forward(lon, lat)
            }
        }
    }
}

/// Transform a single point. Identity when `from == to`.
pub fn transform_point(from: CrsCode, to: CrsCode, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
    Transformer::new(from, to).transform(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let (x, y) = transform_point(CrsCode::Epsg3844, CrsCode::Epsg3844, 1.5, 2.5).unwrap();
        assert_eq!((x, y), (1.5, 2.5));
    }

    #[test]
    fn test_stereo70_wgs84_roundtrip() {
        let to_wgs = Transformer::new(CrsCode::Epsg3844, CrsCode::Epsg4326);
        let to_stereo = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg3844);

        for &(e, n) in &[(500_000.0, 500_000.0), (585_000.0, 325_000.0), (380_000.0, 680_000.0)] {
            let (lon, lat) = to_wgs.transform(e, n).unwrap();
            let (e2, n2) = to_stereo.transform(lon, lat).unwrap();
            // Heights are dropped between datums, which costs a few millimeters.
            assert!((e - e2).abs() < 0.05, "easting roundtrip failed: {} vs {}", e, e2);
            assert!((n - n2).abs() < 0.05, "northing roundtrip failed: {} vs {}", n, n2);
        }
    }

    #[test]
    fn test_false_origin_near_25e_46n() {
        let (lon, lat) =
            transform_point(CrsCode::Epsg3844, CrsCode::Epsg4326, 500_000.0, 500_000.0).unwrap();

        // The datum shift moves the origin by a few seconds of arc at most.
        println!("Stereo70 false origin in WGS84: lon={}, lat={}", lon, lat);
        assert!((lon - 25.0).abs() < 0.01, "lon should be ~25, got {}", lon);
        assert!((lat - 46.0).abs() < 0.01, "lat should be ~46, got {}", lat);
        assert!(
            (lon - 25.0).abs() > 1e-6 || (lat - 46.0).abs() > 1e-6,
            "datum shift should not be a no-op"
        );
    }

    #[test]
    fn test_web_mercator_via_wgs84() {
        let (x, y) = transform_point(CrsCode::Epsg4326, CrsCode::Epsg3857, 0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
    }
}
