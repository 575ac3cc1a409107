//! The extraction pipeline: boundary, clip, coordinates, cache.

use std::path::PathBuf;

use terrain_common::BoundingBox;
use tracing::info;

use crate::boundary::Boundary;
use crate::clip::{BoundingBoxClip, ClipStrategy, ExactMaskClip};
use crate::config::{ClipMode, ExtractionConfig};
use crate::coords::build_coordinate_grids;
use crate::error::{GridProcessorError, Result};
use crate::raster::{GeoTiffRaster, RasterSource};
use crate::types::{CoordinateGrids, ElevationGrid};
use crate::writer::GridCacheWriter;

/// Clipped grids ready to be cached.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub grid: ElevationGrid,
    pub coords: CoordinateGrids,
    /// Nodata sentinel of the source raster.
    pub source_nodata: Option<f64>,
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    pub cache_path: PathBuf,
    pub clip_mode: ClipMode,
    /// (rows, cols)
    pub shape: (usize, usize),
    pub bounds: BoundingBox,
    pub missing: usize,
    pub elevation_range: Option<(f32, f32)>,
    pub bytes_written: u64,
}

/// Runs Boundary Loader, Raster Clipper, Coordinate Grid Builder and
/// Grid Cache Writer in sequence.
pub struct ExtractionPipeline {
    config: ExtractionConfig,
}

impl ExtractionPipeline {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Run the whole pipeline against the configured files.
    pub fn run(&self) -> Result<ExtractionSummary> {
        self.config.validate().map_err(GridProcessorError::config_error)?;

        let boundary = self.load_boundary()?;
        let mut raster = GeoTiffRaster::open(&self.config.raster_path)?;
        let extraction = self.extract(boundary.as_ref(), &mut raster)?;

        let cache_path = self.config.cache_path();
        let written = GridCacheWriter::new(self.config.cache.clone()).write(
            &cache_path,
            &extraction.grid,
            &extraction.coords,
            self.config.clip_mode,
            self.config.target_crs,
            extraction.source_nodata,
        )?;

        let summary = ExtractionSummary {
            cache_path,
            clip_mode: self.config.clip_mode,
            shape: extraction.grid.shape(),
            bounds: extraction.grid.extent(),
            missing: extraction.grid.missing_count(),
            elevation_range: extraction.grid.finite_range(),
            bytes_written: written.bytes_written,
        };

        info!(
            cache = %summary.cache_path.display(),
            clip_mode = %summary.clip_mode,
            rows = summary.shape.0,
            cols = summary.shape.1,
            bounds = %summary.bounds,
            missing = summary.missing,
            "Extraction complete"
        );

        Ok(summary)
    }

    /// Load the boundary, unless an explicit bbox makes it unnecessary.
    pub fn load_boundary(&self) -> Result<Option<Boundary>> {
        if self.config.clip_mode == ClipMode::Bbox && self.config.bbox.is_some() {
            return Ok(None);
        }
        Boundary::load_reprojected(&self.config.boundary_path, self.config.target_crs).map(Some)
    }

    /// Clip `raster` and build the coordinate grids.
    pub fn extract(
        &self,
        boundary: Option<&Boundary>,
        raster: &mut dyn RasterSource,
    ) -> Result<Extraction> {
        if raster.crs() != self.config.target_crs {
            return Err(GridProcessorError::CrsMismatch {
                expected: raster.crs(),
                actual: self.config.target_crs,
            });
        }

        let strategy = self.strategy(boundary)?;
        let clipped = strategy.clip(raster)?;
        let source_nodata = clipped.nodata;

        let grid = clipped.into_elevation_grid()?;
        let (rows, cols) = grid.shape();
        let coords = build_coordinate_grids(rows, cols, &grid.transform);
        coords.check_aligned(&grid)?;

        Ok(Extraction {
            grid,
            coords,
            source_nodata,
        })
    }

    fn strategy<'a>(&self, boundary: Option<&'a Boundary>) -> Result<Box<dyn ClipStrategy + 'a>> {
        match self.config.clip_mode {
            ClipMode::Bbox => {
                let bbox = match (self.config.bbox, boundary) {
                    (Some(bbox), _) => bbox,
                    (None, Some(boundary)) => boundary.bbox()?,
                    (None, None) => {
                        return Err(GridProcessorError::config_error(
                            "bbox clip mode needs a boundary or an explicit bbox",
                        ))
                    }
                };
                Ok(Box::new(BoundingBoxClip::new(bbox)))
            }
            ClipMode::Mask => {
                let boundary = boundary.ok_or_else(|| {
                    GridProcessorError::config_error("mask clip mode needs a boundary")
                })?;
                Ok(Box::new(ExactMaskClip::new(boundary)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MemoryRaster;
    use terrain_common::{CrsCode, GeoTransform};

    fn raster() -> MemoryRaster {
        // 20x10 raster over [0, 20] x [0, 10], 1 degree cells
        let samples: Vec<f64> = (0..200)
            .map(|i| if i % 7 == 0 { -32768.0 } else { i as f64 })
            .collect();
        MemoryRaster::new(
            samples,
            20,
            10,
            GeoTransform::from_origin(0.0, 10.0, 1.0, 1.0),
            Some(-32768.0),
        )
    }

    #[test]
    fn test_extract_with_explicit_bbox() {
        let pipeline = ExtractionPipeline::new(ExtractionConfig {
            bbox: Some(BoundingBox::new(2.0, 1.0, 12.0, 9.0)),
            ..Default::default()
        });
        assert!(pipeline.load_boundary().unwrap().is_none());

        let extraction = pipeline.extract(None, &mut raster()).unwrap();
        assert_eq!(extraction.grid.shape(), (8, 10));
        assert_eq!(extraction.coords.shape(), (8, 10));
        assert_eq!(extraction.coords.lon_at(0, 0), Some(2.0));
        assert_eq!(extraction.coords.lat_at(0, 0), Some(9.0));
        assert_eq!(extraction.source_nodata, Some(-32768.0));

        // source cell (1, 2) holds 22; (1, 8) holds 28, a multiple of 7
        assert_eq!(extraction.grid.elevation(0, 0), Some(22.0));
        assert_eq!(extraction.grid.elevation(0, 6), None);
    }

    #[test]
    fn test_mask_mode_requires_boundary() {
        let pipeline = ExtractionPipeline::new(ExtractionConfig {
            clip_mode: ClipMode::Mask,
            ..Default::default()
        });
        assert!(matches!(
            pipeline.extract(None, &mut raster()),
            Err(GridProcessorError::ConfigError(_))
        ));
    }

    #[test]
    fn test_target_crs_must_match_raster() {
        let pipeline = ExtractionPipeline::new(ExtractionConfig {
            target_crs: CrsCode::Epsg3844,
            bbox: Some(BoundingBox::new(2.0, 1.0, 12.0, 9.0)),
            ..Default::default()
        });
        assert!(matches!(
            pipeline.extract(None, &mut raster()),
            Err(GridProcessorError::CrsMismatch { .. })
        ));
    }
}
