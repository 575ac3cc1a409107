//! Color ramps for elevation backgrounds and track progression.
//!
//! Continuous ramps are piecewise linear between anchor colors taken from
//! matplotlib's `terrain`, `gray` and `Oranges`; `tab10` is categorical.

use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    /// Same color with `alpha` in [0, 1] applied.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Linear color interpolation
pub fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;

    Color::new(
        ((color1.r as f32 * t_inv) + (color2.r as f32 * t)) as u8,
        ((color1.g as f32 * t_inv) + (color2.g as f32 * t)) as u8,
        ((color1.b as f32 * t_inv) + (color2.b as f32 * t)) as u8,
        ((color1.a as f32 * t_inv) + (color2.a as f32 * t)) as u8,
    )
}

const TERRAIN: [(f32, Color); 6] = [
    (0.00, Color::rgb(51, 51, 153)),
    (0.15, Color::rgb(0, 153, 255)),
    (0.25, Color::rgb(0, 204, 102)),
    (0.50, Color::rgb(255, 255, 153)),
    (0.75, Color::rgb(128, 92, 84)),
    (1.00, Color::rgb(255, 255, 255)),
];

const GRAY: [(f32, Color); 2] = [(0.0, Color::BLACK), (1.0, Color::WHITE)];

// ColorBrewer sequential Oranges, 9 classes
const ORANGES: [(f32, Color); 9] = [
    (0.000, Color::rgb(255, 245, 235)),
    (0.125, Color::rgb(254, 230, 206)),
    (0.250, Color::rgb(253, 208, 162)),
    (0.375, Color::rgb(253, 174, 107)),
    (0.500, Color::rgb(253, 141, 60)),
    (0.625, Color::rgb(241, 105, 19)),
    (0.750, Color::rgb(217, 72, 1)),
    (0.875, Color::rgb(166, 54, 3)),
    (1.000, Color::rgb(127, 39, 4)),
];

const TAB10: [Color; 10] = [
    Color::rgb(31, 119, 180),
    Color::rgb(255, 127, 14),
    Color::rgb(44, 160, 44),
    Color::rgb(214, 39, 40),
    Color::rgb(148, 103, 189),
    Color::rgb(140, 86, 75),
    Color::rgb(227, 119, 194),
    Color::rgb(127, 127, 127),
    Color::rgb(188, 189, 34),
    Color::rgb(23, 190, 207),
];

/// Continuous color ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    Terrain,
    Gray,
    Oranges,
}

impl Colormap {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terrain" => Some(Self::Terrain),
            "gray" | "grey" => Some(Self::Gray),
            "oranges" => Some(Self::Oranges),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Gray => "gray",
            Self::Oranges => "oranges",
        }
    }

    fn anchors(&self) -> &'static [(f32, Color)] {
        match self {
            Self::Terrain => &TERRAIN,
            Self::Gray => &GRAY,
            Self::Oranges => &ORANGES,
        }
    }

    /// Color at normalized position `t`, clamped to [0, 1].
    pub fn color(&self, t: f32) -> Color {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        for pair in anchors.windows(2) {
            let (t0, c0) = pair[0];
            let (t1, c1) = pair[1];
            if t <= t1 {
                return interpolate_color(c0, c1, (t - t0) / (t1 - t0));
            }
        }
        anchors[anchors.len() - 1].1
    }
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Categorical color for series `index`; wraps after ten.
pub fn tab10(index: usize) -> Color {
    TAB10[index % TAB10.len()]
}

/// Map grid values to straight RGBA pixels.
///
/// Values are normalized over `[min_val, max_val]`; NaN cells become fully
/// transparent and every other cell gets `alpha`.
pub fn render_grid(
    data: &[f32],
    min_val: f32,
    max_val: f32,
    colormap: Colormap,
    alpha: f32,
) -> Vec<u8> {
    let mut pixels = vec![0u8; data.len() * 4];

    let range = max_val - min_val;
    let range = if range.abs() < f32::EPSILON { 1.0 } else { range };

    for (value, pixel) in data.iter().zip(pixels.chunks_exact_mut(4)) {
        if value.is_nan() {
            continue;
        }
        let color = colormap.color((value - min_val) / range).with_alpha(alpha);
        pixel.copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    pixels
}
