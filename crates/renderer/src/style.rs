//! Map styling: canvas size, layer alpha, strokes and markers.

use serde::{Deserialize, Serialize};

/// Filled circle markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    /// Radius in pixels.
    pub radius: f32,
    /// Opacity in [0, 1].
    pub alpha: f32,
}

impl PointStyle {
    /// Markers for the map with every bear.
    pub const ALL_BEARS: PointStyle = PointStyle {
        radius: 1.5,
        alpha: 0.8,
    };

    /// Markers for a single bear's track.
    pub const TRACK: PointStyle = PointStyle {
        radius: 3.0,
        alpha: 0.85,
    };
}

/// Style shared by every map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    /// Plot area width in pixels; height follows the extent.
    pub width: u32,

    /// Opacity of the elevation background over white.
    pub elevation_alpha: f32,

    /// Boundary stroke width in pixels.
    pub boundary_width: f32,

    /// Color bar strip width in pixels.
    pub colorbar_width: u32,

    /// Gap around color bars in pixels.
    pub margin: u32,

    pub all_bears_points: PointStyle,

    pub track_points: PointStyle,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 1800,
            elevation_alpha: 0.5,
            boundary_width: 1.5,
            colorbar_width: 24,
            margin: 16,
            all_bears_points: PointStyle::ALL_BEARS,
            track_points: PointStyle::TRACK,
        }
    }
}

impl MapStyle {
    /// Validate the style
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.width > 16384 {
            return Err(format!("width must be 1-16384, got {}", self.width));
        }

        if !(0.0..=1.0).contains(&self.elevation_alpha) {
            return Err(format!(
                "elevation_alpha must be 0.0-1.0, got {}",
                self.elevation_alpha
            ));
        }

        if self.boundary_width <= 0.0 {
            return Err("boundary_width must be positive".to_string());
        }

        for (name, points) in [
            ("all_bears_points", &self.all_bears_points),
            ("track_points", &self.track_points),
        ] {
            if points.radius <= 0.0 {
                return Err(format!("{}.radius must be positive", name));
            }
            if !(0.0..=1.0).contains(&points.alpha) {
                return Err(format!("{}.alpha must be 0.0-1.0, got {}", name, points.alpha));
            }
        }

        Ok(())
    }
}
