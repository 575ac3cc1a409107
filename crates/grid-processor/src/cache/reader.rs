//! Lazy reader for grid cache artifacts.

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use terrain_common::BoundingBox;
use tracing::{debug, info};
use zarrs::array::{Array, ElementOwned};
use zarrs::group::Group;
use zarrs_filesystem::FilesystemStore;

use crate::error::{GridProcessorError, Result};
use crate::types::{coordinate_extent, CoordinateGrids, ElevationGrid};
use crate::writer::{GridCacheMetadata, ELEVATION_ARRAY, LAT_ARRAY, LON_ARRAY};

/// An opened cache artifact.
///
/// Opening reads only metadata. Each array is retrieved the first time it
/// is accessed and kept for later calls.
pub struct GridCache {
    path: PathBuf,
    store: Arc<FilesystemStore>,
    metadata: GridCacheMetadata,
    elevation: OnceCell<ElevationGrid>,
    lon: OnceCell<Vec<f64>>,
    lat: OnceCell<Vec<f64>>,
}

impl GridCache {
    /// Open an artifact written by [`crate::GridCacheWriter`].
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(GridProcessorError::storage_error(format!(
                "no grid cache at {}",
                path.display()
            )));
        }

        let store = Arc::new(
            FilesystemStore::new(path).map_err(|e| GridProcessorError::storage_error(e.to_string()))?,
        );
        let group = Group::open(store.clone(), "/")
            .map_err(|e| GridProcessorError::zarr_error(format!("{}: {}", path.display(), e)))?;
        let metadata = GridCacheMetadata::from_attributes(group.attributes())?;

        info!(
            path = %path.display(),
            rows = metadata.shape.0,
            cols = metadata.shape.1,
            clip_mode = %metadata.clip_mode,
            "Opened grid cache"
        );

        Ok(Self {
            path: path.to_path_buf(),
            store,
            metadata,
            elevation: OnceCell::new(),
            lon: OnceCell::new(),
            lat: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &GridCacheMetadata {
        &self.metadata
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.metadata.shape
    }

    /// The elevation grid, NaN where missing.
    pub fn elevation(&self) -> Result<&ElevationGrid> {
        if let Some(grid) = self.elevation.get() {
            return Ok(grid);
        }
        let (rows, cols) = self.metadata.shape;
        let data = self.read_array::<f32>(ELEVATION_ARRAY)?;
        let grid = ElevationGrid::new(data, cols, rows, self.metadata.transform)?;
        Ok(self.elevation.get_or_init(|| grid))
    }

    pub fn lon(&self) -> Result<&[f64]> {
        if let Some(lon) = self.lon.get() {
            return Ok(lon);
        }
        let lon = self.read_array::<f64>(LON_ARRAY)?;
        Ok(self.lon.get_or_init(|| lon))
    }

    pub fn lat(&self) -> Result<&[f64]> {
        if let Some(lat) = self.lat.get() {
            return Ok(lat);
        }
        let lat = self.read_array::<f64>(LAT_ARRAY)?;
        Ok(self.lat.get_or_init(|| lat))
    }

    /// Owned copies of both coordinate grids.
    pub fn coordinate_grids(&self) -> Result<CoordinateGrids> {
        let (rows, cols) = self.metadata.shape;
        Ok(CoordinateGrids {
            lon: self.lon()?.to_vec(),
            lat: self.lat()?.to_vec(),
            width: cols,
            height: rows,
        })
    }

    /// Min/max lon and lat over the coordinate grids.
    pub fn extent(&self) -> Result<BoundingBox> {
        coordinate_extent(self.lon()?, self.lat()?)
            .ok_or_else(|| GridProcessorError::invalid_metadata("cache has no finite coordinates"))
    }

    /// Elevation of the cell containing (lon, lat).
    ///
    /// `None` outside the grid, for non-finite coordinates, or where the
    /// cell is missing.
    pub fn sample(&self, lon: f64, lat: f64) -> Result<Option<f32>> {
        let (row, col) = self.metadata.transform.rowcol(lon, lat)?;
        let (row, col) = (row.floor(), col.floor());
        if !(row.is_finite() && col.is_finite()) || row < 0.0 || col < 0.0 {
            return Ok(None);
        }
        Ok(self.elevation()?.elevation(row as usize, col as usize))
    }

    fn read_array<T: ElementOwned>(&self, name: &str) -> Result<Vec<T>> {
        let array = Array::open(self.store.clone(), name)
            .map_err(|e| GridProcessorError::zarr_error(format!("{}{}: {}", self.path.display(), name, e)))?;

        let expected = self.metadata.shape;
        let shape = array.shape();
        let actual = match shape {
            [rows, cols] => (*rows as usize, *cols as usize),
            _ => {
                return Err(GridProcessorError::invalid_metadata(format!(
                    "{} has {} dimensions, expected 2",
                    name,
                    shape.len()
                )))
            }
        };
        if actual != expected {
            return Err(GridProcessorError::ShapeMismatch { expected, actual });
        }

        let data: Vec<T> = array
            .retrieve_array_subset_elements(&array.subset_all())
            .map_err(|e| GridProcessorError::zarr_error(e.to_string()))?;

        debug!(array = name, rows = actual.0, cols = actual.1, "Retrieved array");
        Ok(data)
    }
}

impl std::fmt::Debug for GridCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridCache")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .finish()
    }
}
