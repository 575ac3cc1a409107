//! Coordinate reference system transformations.
//!
//! Implements the handful of projections the pipeline needs from scratch:
//! WGS84 geographic, Romanian Stereo70 (EPSG:3844) and Web Mercator.

pub mod ellipsoid;
pub mod error;
pub mod helmert;
pub mod mercator;
pub mod stereographic;
pub mod transform;

pub use ellipsoid::Ellipsoid;
pub use error::{ProjectionError, ProjectionResult};
pub use helmert::Helmert;
pub use mercator::WebMercator;
pub use stereographic::ObliqueStereographic;
pub use transform::{transform_point, Transformer};
