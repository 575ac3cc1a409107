//! Seven-parameter Helmert datum shift (position vector convention).

use crate::{ProjectionError, ProjectionResult};
use nalgebra::{Matrix3, Vector3};

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Similarity transform between two earth-centered frames.
///
/// `X' = T + (1 + s) * R * X` with small-angle rotation matrix `R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    /// Translations (meters)
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    /// Rotations (arc-seconds)
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    /// Scale difference (parts per million)
    pub ds_ppm: f64,
}

impl Helmert {
    /// Pulkovo 1942(58) (Stereo70 datum) to WGS84.
    pub const STEREO70_TO_WGS84: Helmert = Helmert {
        tx: 2.329,
        ty: -147.042,
        tz: -92.08,
        rx: 0.309,
        ry: -0.325,
        rz: -0.497,
        ds_ppm: 5.69,
    };

    fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.tx, self.ty, self.tz)
    }

    fn rotation_scale(&self) -> Matrix3<f64> {
        let rx = self.rx * ARCSEC_TO_RAD;
        let ry = self.ry * ARCSEC_TO_RAD;
        let rz = self.rz * ARCSEC_TO_RAD;
        let scale = 1.0 + self.ds_ppm * 1e-6;

        #[rustfmt::skip]
        let rotation = Matrix3::new(
            1.0, -rz,  ry,
             rz, 1.0, -rx,
            -ry,  rx, 1.0,
        );
        rotation * scale
    }

    /// Source frame -> target frame.
    pub fn apply(&self, ecef: &Vector3<f64>) -> Vector3<f64> {
        self.translation() + self.rotation_scale() * ecef
    }

    /// Target frame -> source frame, the exact inverse of [`Helmert::apply`].
    pub fn apply_inverse(&self, ecef: &Vector3<f64>) -> ProjectionResult<Vector3<f64>> {
        let inverse = self
            .rotation_scale()
            .try_inverse()
            .ok_or(ProjectionError::SingularTransform)?;
        Ok(inverse * (ecef - self.translation()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_undoes_forward() {
        let h = Helmert::STEREO70_TO_WGS84;
        let x = Vector3::new(4_094_000.0, 2_006_000.0, 4_440_000.0);

        let back = h.apply_inverse(&h.apply(&x)).unwrap();
        assert_relative_eq!(back, x, epsilon = 1e-6);
    }

    #[test]
    fn test_shift_magnitude() {
        let h = Helmert::STEREO70_TO_WGS84;
        let x = Vector3::new(4_094_000.0, 2_006_000.0, 4_440_000.0);
        let shift = (h.apply(&x) - x).norm();

        // Translation alone is ~174 m; rotation and scale add tens of meters.
        assert!(shift > 100.0 && shift < 300.0, "unexpected shift {}", shift);
    }
}
