//! Elevation Grid Extraction with a Zarr V3 Grid Cache
//!
//! This crate clips a global elevation raster to a region and caches the
//! result, together with per-cell coordinates, as one Zarr V3 artifact:
//!
//! - **Windowed reads**: only the GeoTIFF strips or tiles under the region are decoded
//! - **Two clip modes**: rectangular bounding box, or exact polygon mask
//! - **Reproducible cache**: identical inputs produce an identical artifact
//!
//! # Architecture
//!
//! ```text
//! GeoJSON boundary ──► Boundary::load_reprojected(target CRS)
//!                              │
//!                              ▼
//! GeoTIFF raster ───► ClipStrategy::clip (BoundingBoxClip | ExactMaskClip)
//!                              │
//!                              ├─► nodata -> NaN (ElevationGrid)
//!                              │
//!                              ├─► build_coordinate_grids (lon, lat)
//!                              │
//!                              ▼
//!                     GridCacheWriter::write ──► elevation / lon / lat
//!                                                      │
//!                                                      ▼
//!                                              GridCache::open (lazy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{ClipMode, ExtractionConfig, ExtractionPipeline, GridCache};
//!
//! let config = ExtractionConfig {
//!     clip_mode: ClipMode::Mask,
//!     ..Default::default()
//! };
//! let summary = ExtractionPipeline::new(config).run()?;
//!
//! let cache = GridCache::open(&summary.cache_path)?;
//! let height = cache.sample(25.6, 45.6)?;
//! ```

pub mod boundary;
pub mod cache;
pub mod clip;
pub mod config;
pub mod coords;
pub mod error;
pub mod pipeline;
pub mod raster;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use boundary::{Boundary, Polygon, Ring};
pub use cache::GridCache;
pub use clip::{rasterize_mask, BoundingBoxClip, ClipStrategy, ClippedWindow, ExactMaskClip};
pub use config::{ClipMode, ExtractionConfig, GridProcessorConfig, ZarrCompression};
pub use coords::build_coordinate_grids;
pub use error::{GridProcessorError, Result};
pub use pipeline::{Extraction, ExtractionPipeline, ExtractionSummary};
pub use raster::{GeoTiffRaster, MemoryRaster, RasterSource};
pub use terrain_common::{BoundingBox, CrsCode, GeoTransform, PixelWindow};
pub use types::{coordinate_extent, finite_range, CoordinateGrids, ElevationGrid};
pub use writer::{CacheWriteResult, GridCacheMetadata, GridCacheWriter};
