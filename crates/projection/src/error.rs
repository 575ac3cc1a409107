use terrain_common::CrsCode;
use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("No transformation from {from} to {to}")]
    UnsupportedTransform { from: CrsCode, to: CrsCode },

    #[error("Coordinate out of domain for {crs}: ({x}, {y})")]
    OutOfDomain { crs: CrsCode, x: f64, y: f64 },

    #[error("Inverse projection did not converge after {0} iterations")]
    NoConvergence(usize),

    #[error("Datum transform matrix is singular")]
    SingularTransform,
}
