//! Grid cache writer.
//!
//! Serializes an elevation grid and its coordinate grids into a single
//! Zarr V3 directory store.

mod zarr_writer;

pub use zarr_writer::{
    CacheWriteResult, GridCacheMetadata, GridCacheWriter, ELEVATION_ARRAY, LAT_ARRAY, LON_ARRAY,
};
