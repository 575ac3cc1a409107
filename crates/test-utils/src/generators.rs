//! Test data generators for synthetic elevation rasters.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates int16 elevation samples with a recognizable pattern.
///
/// Cell value is `row * 100 + col`, so a sample identifies its own position
/// as long as `width <= 100`. Row 0 col 0 is 0 m, i.e. sea level, which must
/// never be confused with nodata.
pub fn create_elevation_samples(width: usize, height: usize) -> Vec<i16> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((row * 100 + col) as i16);
        }
    }
    data
}

/// Replaces every `every`-th sample with `nodata`, starting at index `every - 1`.
///
/// Returns the indices that were replaced.
pub fn punch_nodata(samples: &mut [i16], every: usize, nodata: i16) -> Vec<usize> {
    let every = every.max(1);
    let mut punched = Vec::new();
    for idx in (every - 1..samples.len()).step_by(every) {
        samples[idx] = nodata;
        punched.push(idx);
    }
    punched
}

/// Creates a grid with NaN values at specific positions.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `base_value` - Value for non-NaN cells
/// * `nan_positions` - List of (col, row) positions to set as NaN
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    base_value: f32,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![base_value; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}
