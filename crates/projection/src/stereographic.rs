//! Oblique stereographic projection (double projection via a Gauss conformal sphere).
//!
//! The ellipsoid is first mapped conformally onto a sphere tangent at the
//! origin latitude, then projected stereographically from that sphere.
//! This is the construction used for the Romanian Stereo70 grid (EPSG:3844).
//!
//! The projection parameters include:
//! - Origin latitude/longitude (phi0, lon0)
//! - Scale factor at the origin (k0)
//! - False easting/northing

use crate::ellipsoid::Ellipsoid;
use crate::{ProjectionError, ProjectionResult};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

const GAUSS_MAX_ITER: usize = 20;
const GAUSS_TOLERANCE: f64 = 1e-14;

/// Oblique stereographic projection parameters.
#[derive(Debug, Clone)]
pub struct ObliqueStereographic {
    pub ellipsoid: Ellipsoid,
    /// Origin latitude in radians
    pub phi0: f64,
    /// Central meridian in radians
    pub lon0: f64,
    /// Scale factor at the origin
    pub k0: f64,
    /// False easting (meters)
    pub x0: f64,
    /// False northing (meters)
    pub y0: f64,
    gauss: GaussSphere,
    /// Conformal latitude of the origin on the sphere
    chi0: f64,
    sin_chi0: f64,
    cos_chi0: f64,
    /// Twice the radius of the conformal sphere (in units of `a`)
    r2: f64,
}

/// Constants of the conformal mapping from ellipsoid to sphere.
#[derive(Debug, Clone)]
struct GaussSphere {
    e: f64,
    c: f64,
    k: f64,
    ratexp: f64,
}

fn srat(esinp: f64, exp: f64) -> f64 {
    ((1.0 - esinp) / (1.0 + esinp)).powf(exp)
}

impl GaussSphere {
    /// Returns the sphere constants, the conformal origin latitude and the
    /// sphere radius relative to `a`.
    fn new(e: f64, phi0: f64) -> (Self, f64, f64) {
        let es = e * e;
        let sphi = phi0.sin();
        let cphi2 = phi0.cos().powi(2);

        let rc = (1.0 - es).sqrt() / (1.0 - es * sphi * sphi);
        let c = (1.0 + es * cphi2 * cphi2 / (1.0 - es)).sqrt();
        let chi0 = (sphi / c).asin();
        let ratexp = 0.5 * c * e;
        let k = (0.5 * chi0 + FRAC_PI_4).tan()
            / ((0.5 * phi0 + FRAC_PI_4).tan().powf(c) * srat(e * sphi, ratexp));

        (Self { e, c, k, ratexp }, chi0, rc)
    }

    /// Ellipsoidal (lam, phi) to spherical (lam, chi), radians.
    fn forward(&self, lam: f64, phi: f64) -> (f64, f64) {
        let chi = 2.0
            * (self.k
                * (0.5 * phi + FRAC_PI_4).tan().powf(self.c)
                * srat(self.e * phi.sin(), self.ratexp))
            .atan()
            - FRAC_PI_2;
        (self.c * lam, chi)
    }

    fn inverse(&self, lam_s: f64, chi: f64) -> ProjectionResult<(f64, f64)> {
        let lam = lam_s / self.c;
        let num = ((0.5 * chi + FRAC_PI_4).tan() / self.k).powf(1.0 / self.c);

        let mut phi = chi;
        for _ in 0..GAUSS_MAX_ITER {
            let next = 2.0 * (num * srat(self.e * phi.sin(), -0.5 * self.e)).atan() - FRAC_PI_2;
            if (next - phi).abs() < GAUSS_TOLERANCE {
                return Ok((lam, next));
            }
            phi = next;
        }
        Err(ProjectionError::NoConvergence(GAUSS_MAX_ITER))
    }
}

impl ObliqueStereographic {
    /// Create a projection from degrees and meters.
    pub fn new(
        ellipsoid: Ellipsoid,
        lat0_deg: f64,
        lon0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let phi0 = lat0_deg.to_radians();
        let (gauss, chi0, rc) = GaussSphere::new(ellipsoid.e(), phi0);

        Self {
            ellipsoid,
            phi0,
            lon0: lon0_deg.to_radians(),
            k0,
            x0: false_easting,
            y0: false_northing,
            gauss,
            chi0,
            sin_chi0: chi0.sin(),
            cos_chi0: chi0.cos(),
            r2: 2.0 * rc,
        }
    }

    /// Stereo70: origin 46N 25E, k0 = 0.99975, false origin 500 km / 500 km,
    /// Krassowsky 1940 ellipsoid.
    pub fn stereo70() -> Self {
        Self::new(
            Ellipsoid::KRASSOWSKY_1940,
            46.0,
            25.0,
            0.99975,
            500_000.0,
            500_000.0,
        )
    }

    /// Geodetic (lon, lat in degrees) on this projection's ellipsoid to (easting, northing).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> ProjectionResult<(f64, f64)> {
        let lam = lon_deg.to_radians() - self.lon0;
        let phi = lat_deg.to_radians();
        let (lam, chi) = self.gauss.forward(lam, phi);

        let sin_chi = chi.sin();
        let cos_chi = chi.cos();
        let cos_lam = lam.cos();

        let denom = 1.0 + self.sin_chi0 * sin_chi + self.cos_chi0 * cos_chi * cos_lam;
        if denom <= 1e-12 {
            // antipode of the origin
            return Err(ProjectionError::OutOfDomain {
                crs: terrain_common::CrsCode::Epsg3844,
                x: lon_deg,
                y: lat_deg,
            });
        }
        let k = self.k0 * self.r2 / denom;

        let x = k * cos_chi * lam.sin();
        let y = k * (self.cos_chi0 * sin_chi - self.sin_chi0 * cos_chi * cos_lam);

        Ok((
            self.ellipsoid.a * x + self.x0,
            self.ellipsoid.a * y + self.y0,
        ))
    }

    /// (easting, northing) to geodetic (lon, lat in degrees) on this projection's ellipsoid.
    pub fn inverse(&self, easting: f64, northing: f64) -> ProjectionResult<(f64, f64)> {
        let x = (easting - self.x0) / self.ellipsoid.a / self.k0;
        let y = (northing - self.y0) / self.ellipsoid.a / self.k0;

        let rho = x.hypot(y);
        let (lam, chi) = if rho > 0.0 {
            let c = 2.0 * rho.atan2(self.r2);
            let sin_c = c.sin();
            let cos_c = c.cos();
            let chi = (cos_c * self.sin_chi0 + y * sin_c * self.cos_chi0 / rho).asin();
            let lam = (x * sin_c).atan2(rho * self.cos_chi0 * cos_c - y * self.sin_chi0 * sin_c);
            (lam, chi)
        } else {
            (0.0, self.chi0)
        };

        let (lam, phi) = self.gauss.inverse(lam, chi)?;
        Ok(((lam + self.lon0).to_degrees(), phi.to_degrees()))
    }
}
