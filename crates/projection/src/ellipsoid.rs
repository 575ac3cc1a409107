//! Reference ellipsoids and geodetic <-> earth-centered conversions.

use nalgebra::Vector3;

/// A reference ellipsoid given by semi-major axis and inverse flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Inverse flattening
    pub rf: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        rf: 298.257_223_563,
    };

    /// Krassowsky 1940, the ellipsoid of the Pulkovo 1942(58) datum behind Stereo70.
    pub const KRASSOWSKY_1940: Ellipsoid = Ellipsoid {
        a: 6_378_245.0,
        rf: 298.3,
    };

    pub fn flattening(&self) -> f64 {
        1.0 / self.rf
    }

    /// First eccentricity squared.
    pub fn es(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    /// First eccentricity.
    pub fn e(&self) -> f64 {
        self.es().sqrt()
    }

    /// Prime vertical radius of curvature at latitude `phi` (radians).
    fn prime_vertical_radius(&self, phi: f64) -> f64 {
        let s = phi.sin();
        self.a / (1.0 - self.es() * s * s).sqrt()
    }

    /// Geodetic (lon, lat in degrees, height in meters) to ECEF meters.
    pub fn geodetic_to_ecef(&self, lon_deg: f64, lat_deg: f64, h: f64) -> Vector3<f64> {
        let lam = lon_deg.to_radians();
        let phi = lat_deg.to_radians();
        let n = self.prime_vertical_radius(phi);

        Vector3::new(
            (n + h) * phi.cos() * lam.cos(),
            (n + h) * phi.cos() * lam.sin(),
            (n * (1.0 - self.es()) + h) * phi.sin(),
        )
    }

    /// ECEF meters to geodetic (lon, lat in degrees, height in meters).
    ///
    /// Fixed-point iteration on latitude; converges to sub-millimeter in a
    /// few steps for points near the surface.
    pub fn ecef_to_geodetic(&self, ecef: &Vector3<f64>) -> (f64, f64, f64) {
        let es = self.es();
        let p = ecef.x.hypot(ecef.y);
        let lam = ecef.y.atan2(ecef.x);

        let mut phi = ecef.z.atan2(p * (1.0 - es));
        let mut h = 0.0;
        for _ in 0..10 {
            let n = self.prime_vertical_radius(phi);
            h = p / phi.cos() - n;
            let next = ecef.z.atan2(p * (1.0 - es * n / (n + h)));
            let done = (next - phi).abs() < 1e-14;
            phi = next;
            if done {
                break;
            }
        }

        (lam.to_degrees(), phi.to_degrees(), h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wgs84_constants() {
        assert_relative_eq!(Ellipsoid::WGS84.es(), 0.006_694_379_990_14, epsilon = 1e-12);
    }

    #[test]
    fn test_ecef_roundtrip() {
        for ellps in [Ellipsoid::WGS84, Ellipsoid::KRASSOWSKY_1940] {
            let ecef = ellps.geodetic_to_ecef(26.1025, 44.4268, 85.0);
            let (lon, lat, h) = ellps.ecef_to_geodetic(&ecef);
            assert_relative_eq!(lon, 26.1025, epsilon = 1e-10);
            assert_relative_eq!(lat, 44.4268, epsilon = 1e-10);
            assert_relative_eq!(h, 85.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_equator_prime_meridian() {
        let ecef = Ellipsoid::WGS84.geodetic_to_ecef(0.0, 0.0, 0.0);
        assert_relative_eq!(ecef.x, 6_378_137.0, epsilon = 1e-6);
        assert_relative_eq!(ecef.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ecef.z, 0.0, epsilon = 1e-6);
    }
}
