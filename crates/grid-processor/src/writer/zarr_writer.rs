//! Zarr V3 writer for the elevation grid cache.
//!
//! One artifact is a directory store holding a group with three arrays:
//! `elevation` (f32), `lon` and `lat` (f64), all with the same shape.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terrain_common::{BoundingBox, CrsCode, GeoTransform};
use tracing::{debug, info};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{ArrayBuilder, DataType, Element, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

use crate::config::{ClipMode, GridProcessorConfig, ZarrCompression};
use crate::error::{GridProcessorError, Result};
use crate::types::{CoordinateGrids, ElevationGrid};

/// Array names inside the cache group.
pub const ELEVATION_ARRAY: &str = "/elevation";
pub const LON_ARRAY: &str = "/lon";
pub const LAT_ARRAY: &str = "/lat";

/// Group attributes of a cache artifact.
///
/// Deliberately free of timestamps so that identical inputs produce
/// identical artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCacheMetadata {
    /// Grid dimensions (rows, cols).
    pub shape: (usize, usize),
    /// Square chunk edge.
    pub chunk_size: usize,
    /// Compression codec used.
    pub compression: String,
    pub crs: CrsCode,
    pub clip_mode: ClipMode,
    /// Transform of the clipped window.
    pub transform: GeoTransform,
    /// Extent of the grid cells.
    pub bounds: BoundingBox,
    /// No-data sentinel of the source raster, before NaN conversion.
    pub source_nodata: Option<f64>,
    /// Elevation units.
    pub units: String,
}

impl GridCacheMetadata {
    /// Serialize to a JSON object for the group attributes.
    pub fn to_attributes(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(GridProcessorError::invalid_metadata(format!(
                "cache metadata serialized to {}, expected an object",
                other
            ))),
        }
    }

    /// Deserialize from group attributes.
    pub fn from_attributes(attrs: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(attrs.clone()))
            .map_err(|e| GridProcessorError::invalid_metadata(e.to_string()))
    }
}

/// Result of writing a cache artifact.
#[derive(Debug)]
pub struct CacheWriteResult {
    pub path: PathBuf,
    pub metadata: GridCacheMetadata,
    /// Uncompressed bytes across the three arrays.
    pub bytes_written: u64,
}

/// Writer for elevation grid cache artifacts.
pub struct GridCacheWriter {
    config: GridProcessorConfig,
}

impl GridCacheWriter {
    pub fn new(config: GridProcessorConfig) -> Self {
        Self { config }
    }

    /// Write `grid` and its coordinate grids to a fresh artifact at `path`.
    ///
    /// Anything already at `path` is removed first.
    pub fn write(
        &self,
        path: &Path,
        grid: &ElevationGrid,
        coords: &CoordinateGrids,
        clip_mode: ClipMode,
        crs: CrsCode,
        source_nodata: Option<f64>,
    ) -> Result<CacheWriteResult> {
        coords.check_aligned(grid)?;
        self.config.validate().map_err(GridProcessorError::config_error)?;

        remove_existing(path)?;
        std::fs::create_dir_all(path)?;
        let store = Arc::new(
            FilesystemStore::new(path).map_err(|e| GridProcessorError::storage_error(e.to_string()))?,
        );

        let metadata = GridCacheMetadata {
            shape: grid.shape(),
            chunk_size: self.config.zarr_chunk_size,
            compression: self.config.zarr_compression.as_str().to_string(),
            crs,
            clip_mode,
            transform: grid.transform,
            bounds: grid.extent(),
            source_nodata,
            units: "m".to_string(),
        };

        let group = GroupBuilder::new()
            .attributes(metadata.to_attributes()?)
            .build(store.clone(), "/")
            .map_err(|e| GridProcessorError::zarr_error(e.to_string()))?;
        group
            .store_metadata()
            .map_err(|e| GridProcessorError::storage_error(e.to_string()))?;

        let (rows, cols) = grid.shape();
        self.write_array(&store, ELEVATION_ARRAY, &grid.data, rows, cols, DataType::Float32, FillValue::from(f32::NAN), 4)?;
        self.write_array(&store, LON_ARRAY, &coords.lon, rows, cols, DataType::Float64, FillValue::from(f64::NAN), 8)?;
        self.write_array(&store, LAT_ARRAY, &coords.lat, rows, cols, DataType::Float64, FillValue::from(f64::NAN), 8)?;

        let bytes_written = (grid.data.len() * std::mem::size_of::<f32>()
            + (coords.lon.len() + coords.lat.len()) * std::mem::size_of::<f64>())
            as u64;

        info!(
            path = %path.display(),
            rows,
            cols,
            missing = grid.missing_count(),
            compression = %self.config.zarr_compression,
            bytes_written,
            "Wrote grid cache"
        );

        Ok(CacheWriteResult {
            path: path.to_path_buf(),
            metadata,
            bytes_written,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn write_array<T: Element>(
        &self,
        store: &Arc<FilesystemStore>,
        path: &str,
        data: &[T],
        rows: usize,
        cols: usize,
        data_type: DataType,
        fill_value: FillValue,
        typesize: usize,
    ) -> Result<()> {
        let chunk_size = self.config.zarr_chunk_size as u64;
        let chunk_grid: zarrs::array::ChunkGrid = vec![chunk_size, chunk_size]
            .try_into()
            .map_err(|e| GridProcessorError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![rows as u64, cols as u64], // shape [rows, cols]
            data_type,
            chunk_grid,
            fill_value,
        );
        let mut builder = &mut binding;

        if self.config.zarr_compression != ZarrCompression::None {
            let codec = self.create_compression_codec(typesize)?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let array = builder
            .build(store.clone(), path)
            .map_err(|e| GridProcessorError::zarr_error(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| GridProcessorError::storage_error(e.to_string()))?;

        // An empty subset has nothing to store
        if rows == 0 || cols == 0 {
            return Ok(());
        }

        let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![rows as u64, cols as u64])
            .map_err(|e| GridProcessorError::zarr_error(e.to_string()))?;

        array
            .store_array_subset_elements(&subset, data)
            .map_err(|e| GridProcessorError::storage_error(e.to_string()))?;

        debug!(array = path, rows, cols, "Stored array");
        Ok(())
    }

    /// Create the compression codec for elements of `typesize` bytes.
    fn create_compression_codec(
        &self,
        typesize: usize,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.zarr_compression_level)
            .map_err(|_| GridProcessorError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.zarr_shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = self.config.zarr_shuffle.then_some(typesize);

        let compressor = match self.config.zarr_compression {
            ZarrCompression::None => {
                return Err(GridProcessorError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| GridProcessorError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %path.display(), "Removing previous cache artifact");
            std::fs::remove_dir_all(path)?;
        }
        Ok(_) => std::fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
