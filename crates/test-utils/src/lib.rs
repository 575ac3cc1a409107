//! Test support for the bear-terrain crates.
//!
//! Synthetic inputs are written on the fly: int16 GeoTIFFs with GeoTIFF
//! tags, GeoJSON rectangles and polygons with holes, and a small bear CSV.
//! Tests against the real WorldClim raster locate it with
//! [`require_test_file!`] and skip when it is absent.

pub mod fixtures;
pub mod generators;
pub mod geotiff;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use geotiff::*;
pub use paths::*;

/// Resolve a data file through [`find_test_file`], or return early from the
/// calling test with a skip notice.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: '{}' not found; set TEST_DATA_DIR to run this test.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Assert two numbers are within `epsilon`, printing both on failure.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
