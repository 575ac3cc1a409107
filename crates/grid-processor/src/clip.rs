//! Clip strategies: rectangular bounding-box reads and exact polygon masks.
//!
//! Both strategies read only the window they need and return the raw samples
//! with the window's transform. Nodata-to-NaN conversion happens afterwards
//! in [`ClippedWindow::into_elevation_grid`].

use terrain_common::{BoundingBox, GeoTransform, PixelWindow, Window};
use tracing::{debug, info};

use crate::boundary::Boundary;
use crate::config::ClipMode;
use crate::error::Result;
use crate::raster::RasterSource;
use crate::types::ElevationGrid;

/// Samples read from a raster window, before missing-data conversion.
#[derive(Debug, Clone)]
pub struct ClippedWindow {
    /// Row-major samples, `window.width * window.height` long.
    pub samples: Vec<f64>,
    pub window: PixelWindow,
    /// Transform of the window's upper-left pixel.
    pub transform: GeoTransform,
    /// The source raster's nodata sentinel.
    pub nodata: Option<f64>,
}

impl ClippedWindow {
    /// Cast to f32 and replace every nodata sample with NaN.
    pub fn into_elevation_grid(self) -> Result<ElevationGrid> {
        ElevationGrid::from_samples(
            &self.samples,
            self.nodata,
            self.window.width,
            self.window.height,
            self.transform,
        )
    }
}

/// A way of restricting a raster to a region.
pub trait ClipStrategy {
    fn mode(&self) -> ClipMode;

    /// Read the clipped window from `raster`.
    fn clip(&self, raster: &mut dyn RasterSource) -> Result<ClippedWindow>;
}

/// Rectangular window covering a bounding box.
#[derive(Debug, Clone)]
pub struct BoundingBoxClip {
    pub bbox: BoundingBox,
}

impl BoundingBoxClip {
    pub fn new(bbox: BoundingBox) -> Self {
        Self { bbox }
    }
}

impl ClipStrategy for BoundingBoxClip {
    fn mode(&self) -> ClipMode {
        ClipMode::Bbox
    }

    fn clip(&self, raster: &mut dyn RasterSource) -> Result<ClippedWindow> {
        let transform = raster.transform();
        transform.require_north_up()?;

        let fractional = Window::from_bounds(&self.bbox, &transform)?;
        let window = fractional
            .round_nearest()
            .clamp_to(raster.width(), raster.height())?;
        debug!(?fractional, ?window, bbox = %self.bbox, "Bounding-box window");

        let samples = raster.read_window(&window)?;
        let window_transform = transform.window_transform(&window);

        info!(
            rows = window.height,
            cols = window.width,
            col_off = window.col_off,
            row_off = window.row_off,
            "Clipped raster to bounding box"
        );

        Ok(ClippedWindow {
            samples,
            window,
            transform: window_transform,
            nodata: raster.nodata(),
        })
    }
}

/// Crop to a boundary's extent and blank every cell whose center lies
/// outside all of its polygons.
#[derive(Debug, Clone)]
pub struct ExactMaskClip<'a> {
    pub boundary: &'a Boundary,
}

impl<'a> ExactMaskClip<'a> {
    pub fn new(boundary: &'a Boundary) -> Self {
        Self { boundary }
    }
}

impl ClipStrategy for ExactMaskClip<'_> {
    fn mode(&self) -> ClipMode {
        ClipMode::Mask
    }

    fn clip(&self, raster: &mut dyn RasterSource) -> Result<ClippedWindow> {
        self.boundary.require_crs(raster.crs())?;

        let transform = raster.transform();
        transform.require_north_up()?;

        let bbox = self.boundary.bbox()?;
        let window = Window::from_bounds(&bbox, &transform)?
            .round_outward()
            .clamp_to(raster.width(), raster.height())?;

        let mut samples = raster.read_window(&window)?;
        let window_transform = transform.window_transform(&window);

        let mask = rasterize_mask(self.boundary, &window_transform, window.width, window.height);
        let fill = raster.nodata().unwrap_or(f64::NAN);
        let mut outside = 0usize;
        for (value, inside) in samples.iter_mut().zip(&mask) {
            if !inside {
                *value = fill;
                outside += 1;
            }
        }

        info!(
            rows = window.height,
            cols = window.width,
            outside,
            "Clipped raster to boundary mask"
        );

        Ok(ClippedWindow {
            samples,
            window,
            transform: window_transform,
            nodata: raster.nodata(),
        })
    }
}

/// Cell-center inclusion mask of `boundary` over a `width` x `height` grid.
///
/// Scanline fill: for each row, ring edges are intersected with the line
/// through the row's cell centers and the spans between pairs of crossings
/// are filled (even-odd per polygon, OR across polygons). Cells touched by
/// the outline but centered outside it stay excluded.
pub fn rasterize_mask(
    boundary: &Boundary,
    transform: &GeoTransform,
    width: usize,
    height: usize,
) -> Vec<bool> {
    let mut mask = vec![false; width * height];
    let mut crossings: Vec<f64> = Vec::new();

    for polygon in &boundary.polygons {
        let edges: Vec<((f64, f64), (f64, f64))> = polygon
            .rings
            .iter()
            .flat_map(|ring| {
                let n = ring.len();
                (0..n).map(move |i| (ring[(i + n - 1) % n], ring[i]))
            })
            .collect();

        for row in 0..height {
            let y = transform.f + (row as f64 + 0.5) * transform.e;

            crossings.clear();
            for &((x1, y1), (x2, y2)) in &edges {
                if (y1 > y) != (y2 > y) {
                    crossings.push(x1 + (y - y1) * (x2 - x1) / (y2 - y1));
                }
            }
            crossings.sort_by(f64::total_cmp);

            let row_cells = &mut mask[row * width..(row + 1) * width];
            for span in crossings.chunks_exact(2) {
                let start = first_center_at_or_after(span[0], transform);
                let end = first_center_at_or_after(span[1], transform).min(width);
                for cell in row_cells.iter_mut().take(end).skip(start) {
                    *cell = true;
                }
            }
        }
    }

    mask
}

/// Index of the first column whose center x is >= `x`.
fn first_center_at_or_after(x: f64, transform: &GeoTransform) -> usize {
    ((x - transform.c) / transform.a - 0.5).ceil().max(0.0) as usize
}
