//! Elevation map rendering for bear telemetry.
//!
//! - Colormaps: `terrain`, `gray`, `oranges` ramps and `tab10` categories
//! - Canvas: elevation background, boundary strokes, point markers, color bars
//! - PNG encoding, indexed when the image fits a 256-color palette

pub mod canvas;
pub mod colormap;
pub mod error;
pub mod maps;
pub mod png;
pub mod style;
pub mod viewport;

pub use canvas::{ColorBar, ElevationLayer, MapCanvas, MapImage};
pub use colormap::{interpolate_color, render_grid, tab10, Color, Colormap};
pub use error::{RenderError, Result};
pub use maps::{render_all_bears, render_track, track_file_name, MapLayers};
pub use style::{MapStyle, PointStyle};
pub use viewport::Viewport;
