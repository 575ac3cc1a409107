//! Bear GPS telemetry.
//!
//! Loads the tracking CSV, reprojects fixes from Stereo70 to WGS84, groups
//! them into per-bear tracks and provides the zoom and progression math used
//! by the track maps.
//!
//! # Example
//!
//! ```ignore
//! use tracking::{load_tracks, TrackingConfig};
//!
//! let config = TrackingConfig::default();
//! let tracks = load_tracks(&config.csv_path, config.source_crs)?;
//! for track in &tracks {
//!     println!("{}: {} fixes", track.bear, track.len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod observation;
pub mod track;

pub use config::TrackingConfig;
pub use error::{Result, TrackingError};
pub use loader::{load_observations, load_tracks, read_observations, REQUIRED_COLUMNS};
pub use observation::{parse_timestamp, Observation};
pub use track::{linspace, BearTracks, DateTick, Track, DATE_TICKS, MIN_ZOOM_SPAN, ZOOM_FACTOR};
