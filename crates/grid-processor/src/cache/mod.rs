//! Read side of the grid cache.

mod reader;

pub use reader::GridCache;
