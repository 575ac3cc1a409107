//! The two bear maps: every bear over Romania, and one bear's track.

use terrain_common::BoundingBox;
use tracing::{debug, info};
use tracking::{BearTracks, Track, DATE_TICKS, ZOOM_FACTOR};

use crate::canvas::{ColorBar, ElevationLayer, MapCanvas, MapImage};
use crate::colormap::{tab10, Color, Colormap};
use crate::error::{RenderError, Result};
use crate::style::MapStyle;
use crate::viewport::Viewport;

/// Background shared by every map.
#[derive(Debug, Clone)]
pub struct MapLayers<'a> {
    pub elevation: ElevationLayer<'a>,
    /// Boundary rings in lon/lat.
    pub boundary: Vec<&'a [(f64, f64)]>,
}

impl<'a> MapLayers<'a> {
    pub fn new<I>(elevation: ElevationLayer<'a>, rings: I) -> Self
    where
        I: IntoIterator<Item = &'a [(f64, f64)]>,
    {
        Self {
            elevation,
            boundary: rings.into_iter().collect(),
        }
    }

    /// Extent of the boundary rings.
    pub fn boundary_extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.boundary.iter().flat_map(|ring| ring.iter().copied()))
    }
}

/// Every bear in its own categorical color over a terrain background,
/// cropped to the boundary.
pub fn render_all_bears(
    layers: &MapLayers<'_>,
    tracks: &BearTracks,
    style: &MapStyle,
) -> Result<MapImage> {
    let extent = layers
        .boundary_extent()
        .ok_or_else(|| RenderError::invalid_extent("boundary has no vertices"))?;
    let viewport = Viewport::geographic(extent, style.width)?;

    let mut canvas = MapCanvas::new(viewport)?;
    canvas.draw_elevation(&layers.elevation, Colormap::Terrain, style.elevation_alpha)?;

    let mut drawn = 0;
    for (i, track) in tracks.iter().enumerate() {
        drawn += canvas.draw_points(track.positions(), tab10(i), style.all_bears_points);
    }
    canvas.draw_rings(layers.boundary.iter().copied(), Color::BLACK, style.boundary_width);

    info!(
        bears = tracks.len(),
        points = drawn,
        width = viewport.width,
        height = viewport.height,
        extent = %extent,
        "Rendered all-bears map"
    );

    canvas.finish(
        &[ColorBar::new(Colormap::Terrain, style.elevation_alpha)],
        style.colorbar_width,
        style.margin,
    )
}

/// One bear's fixes colored by progression over a grayscale background,
/// zoomed to the track.
pub fn render_track(layers: &MapLayers<'_>, track: &Track, style: &MapStyle) -> Result<MapImage> {
    let extent = track.zoom_extent(ZOOM_FACTOR).ok_or_else(|| {
        RenderError::invalid_extent(format!("track of {} has no fixes", track.bear))
    })?;
    let viewport = Viewport::geographic(extent, style.width)?;

    let mut canvas = MapCanvas::new(viewport)?;
    canvas.draw_elevation(&layers.elevation, Colormap::Gray, style.elevation_alpha)?;

    let progression = track.progression();
    let points = track
        .positions()
        .zip(progression.iter())
        .map(|(pos, &t)| (pos, Colormap::Oranges.color(t as f32)));
    let drawn = canvas.draw_colored_points(points, style.track_points);
    canvas.draw_rings(layers.boundary.iter().copied(), Color::BLACK, style.boundary_width);

    let ticks = track.date_ticks(DATE_TICKS);
    debug!(
        bear = %track.bear,
        ticks = ?ticks.iter().map(|t| t.label.as_str()).collect::<Vec<_>>(),
        "Progression ticks"
    );
    info!(
        bear = %track.bear,
        points = drawn,
        width = viewport.width,
        height = viewport.height,
        extent = %extent,
        "Rendered track map"
    );

    canvas.finish(
        &[
            ColorBar::new(Colormap::Gray, style.elevation_alpha),
            ColorBar::new(Colormap::Oranges, 1.0),
        ],
        style.colorbar_width,
        style.margin,
    )
}

/// File name of a bear's track map, with path separators replaced.
pub fn track_file_name(bear: &str) -> String {
    let safe: String = bear
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{}_track.png", safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_file_name() {
        assert_eq!(track_file_name("Ursu"), "Ursu_track.png");
        assert_eq!(track_file_name("a/b"), "a_b_track.png");
    }

    #[test]
    fn test_boundary_extent() {
        let values = [1.0f32];
        let layer = ElevationLayer::new(&values, 1, 1, BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        let ring_a = [(20.0, 44.0), (25.0, 48.0), (21.0, 45.0)];
        let ring_b = [(29.0, 43.5), (28.0, 46.0)];
        let layers = MapLayers::new(layer, [&ring_a[..], &ring_b[..]]);

        let extent = layers.boundary_extent().unwrap();
        assert_eq!(extent.to_array(), [20.0, 43.5, 29.0, 48.0]);

        let empty = MapLayers::new(layer, Vec::<&[(f64, f64)]>::new());
        assert!(empty.boundary_extent().is_none());
    }
}
