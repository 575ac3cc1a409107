//! Map canvas: elevation background, boundary strokes, point markers and
//! color bars drawn with tiny-skia.

use std::path::Path;

use terrain_common::BoundingBox;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Rect, Stroke, Transform,
};
use tracing::{debug, warn};

use crate::colormap::{render_grid, Color, Colormap};
use crate::error::{RenderError, Result};
use crate::png::create_png_auto;
use crate::style::PointStyle;
use crate::viewport::Viewport;

/// A row-major elevation grid placed on the map by its extent.
///
/// Row 0 is the northern edge.
#[derive(Debug, Clone, Copy)]
pub struct ElevationLayer<'a> {
    pub values: &'a [f32],
    pub width: usize,
    pub height: usize,
    pub extent: BoundingBox,
}

impl<'a> ElevationLayer<'a> {
    pub fn new(values: &'a [f32], width: usize, height: usize, extent: BoundingBox) -> Result<Self> {
        if values.len() != width * height {
            return Err(RenderError::ShapeMismatch {
                expected: width * height,
                actual: values.len(),
            });
        }
        Ok(Self {
            values,
            width,
            height,
            extent,
        })
    }

    /// Min and max over finite values.
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A vertical color bar, 0 at the bottom and 1 at the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBar {
    pub colormap: Colormap,
    pub alpha: f32,
}

impl ColorBar {
    pub fn new(colormap: Colormap, alpha: f32) -> Self {
        Self { colormap, alpha }
    }
}

/// The plot area of a map.
pub struct MapCanvas {
    viewport: Viewport,
    pixmap: Pixmap,
}

impl MapCanvas {
    /// A white canvas covering `viewport`.
    pub fn new(viewport: Viewport) -> Result<Self> {
        let mut pixmap = new_pixmap(viewport.width, viewport.height)?;
        pixmap.fill(tiny_skia::Color::WHITE);
        Ok(Self { viewport, pixmap })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Color at pixel (x, y), unpremultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        pixel_at(&self.pixmap, x, y)
    }

    /// Draw the elevation grid with `colormap`, normalized over its finite
    /// range. NaN cells stay transparent.
    pub fn draw_elevation(
        &mut self,
        layer: &ElevationLayer<'_>,
        colormap: Colormap,
        alpha: f32,
    ) -> Result<()> {
        let Some((min_val, max_val)) = layer.finite_range() else {
            warn!("Elevation layer has no finite values, skipping");
            return Ok(());
        };
        let extent = layer.extent;
        if extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(RenderError::invalid_extent(format!(
                "elevation layer extent {}",
                extent
            )));
        }

        let mut rgba = render_grid(layer.values, min_val, max_val, colormap, alpha);
        premultiply(&mut rgba);

        let size = IntSize::from_wh(layer.width as u32, layer.height as u32).ok_or(
            RenderError::CanvasAllocation {
                width: layer.width as u32,
                height: layer.height as u32,
            },
        )?;
        let image = Pixmap::from_vec(rgba, size).ok_or(RenderError::CanvasAllocation {
            width: layer.width as u32,
            height: layer.height as u32,
        })?;

        let (x0, y0) = self.viewport.to_pixel(extent.min_x, extent.max_y);
        let (x1, y1) = self.viewport.to_pixel(extent.max_x, extent.min_y);
        let transform = Transform::from_row(
            (x1 - x0) / layer.width as f32,
            0.0,
            0.0,
            (y1 - y0) / layer.height as f32,
            x0,
            y0,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, transform, None);

        debug!(
            colormap = %colormap,
            min = min_val,
            max = max_val,
            extent = %extent,
            "Drew elevation layer"
        );
        Ok(())
    }

    /// Stroke each ring as a closed polyline.
    pub fn draw_rings<'r, I>(&mut self, rings: I, color: Color, width: f32)
    where
        I: IntoIterator<Item = &'r [(f64, f64)]>,
    {
        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };

        for ring in rings {
            let Some(((first_x, first_y), rest)) = ring.split_first() else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }

            let mut pb = PathBuilder::new();
            let (x, y) = self.viewport.to_pixel(*first_x, *first_y);
            pb.move_to(x, y);
            for &(lon, lat) in rest {
                let (x, y) = self.viewport.to_pixel(lon, lat);
                pb.line_to(x, y);
            }
            pb.close();

            if let Some(path) = pb.finish() {
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }

    /// Draw every position in one color. Returns the number drawn.
    pub fn draw_points<I>(&mut self, points: I, color: Color, style: PointStyle) -> usize
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        self.draw_colored_points(points.into_iter().map(|p| (p, color)), style)
    }

    /// Draw positions with individual colors, in order. Markers entirely off
    /// the canvas are skipped. Returns the number drawn.
    pub fn draw_colored_points<I>(&mut self, points: I, style: PointStyle) -> usize
    where
        I: IntoIterator<Item = ((f64, f64), Color)>,
    {
        let (w, h) = (self.viewport.width as f32, self.viewport.height as f32);
        let r = style.radius;
        let mut paint = Paint::default();
        paint.anti_alias = true;

        let mut drawn = 0;
        for ((lon, lat), color) in points {
            let (x, y) = self.viewport.to_pixel(lon, lat);
            if x < -r || y < -r || x > w + r || y > h + r {
                continue;
            }
            paint.set_color(color.with_alpha(style.alpha).to_skia());
            if let Some(path) = PathBuilder::from_circle(x, y, r) {
                self.pixmap
                    .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                drawn += 1;
            }
        }
        drawn
    }

    /// Lay out the plot with color bars to its right.
    pub fn finish(self, colorbars: &[ColorBar], bar_width: u32, margin: u32) -> Result<MapImage> {
        let plot_w = self.viewport.width;
        let height = self.viewport.height;
        let extra = if colorbars.is_empty() {
            0
        } else {
            colorbars.len() as u32 * (margin + bar_width) + margin
        };

        let mut pixmap = new_pixmap(plot_w + extra, height)?;
        pixmap.fill(tiny_skia::Color::WHITE);
        pixmap.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        let (top, bottom) = if height > 2 * margin + 1 {
            (margin, height - margin)
        } else {
            (0, height)
        };
        for (i, bar) in colorbars.iter().enumerate() {
            let x = plot_w + margin + i as u32 * (margin + bar_width);
            draw_colorbar(&mut pixmap, bar, x, top, bar_width, bottom - top);
        }

        Ok(MapImage { pixmap })
    }
}

/// A finished map.
pub struct MapImage {
    pixmap: Pixmap,
}

impl MapImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        pixel_at(&self.pixmap, x, y)
    }

    /// Unpremultiplied RGBA bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        create_png_auto(&self.to_rgba(), self.width() as usize, self.height() as usize)
    }

    /// Encode and write to `path`, creating parent directories. Returns the
    /// number of bytes written.
    pub fn save_png(&self, path: &Path) -> Result<usize> {
        let png = self.encode_png()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RenderError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, &png).map_err(|source| RenderError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            path = %path.display(),
            width = self.width(),
            height = self.height(),
            bytes = png.len(),
            "Wrote PNG"
        );
        Ok(png.len())
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(RenderError::CanvasAllocation { width, height })
}

fn pixel_at(pixmap: &Pixmap, x: u32, y: u32) -> Option<Color> {
    pixmap.pixel(x, y).map(|p| {
        let c = p.demultiply();
        Color::new(c.red(), c.green(), c.blue(), c.alpha())
    })
}

fn premultiply(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for channel in &mut px[..3] {
            *channel = ((*channel as u32 * a + 127) / 255) as u8;
        }
    }
}

fn draw_colorbar(pixmap: &mut Pixmap, bar: &ColorBar, x: u32, top: u32, width: u32, height: u32) {
    if height == 0 || width == 0 {
        return;
    }

    let mut paint = Paint::default();
    for row in 0..height {
        let t = if height == 1 {
            1.0
        } else {
            1.0 - row as f32 / (height - 1) as f32
        };
        paint.set_color(bar.colormap.color(t).with_alpha(bar.alpha).to_skia());
        if let Some(rect) = Rect::from_xywh(x as f32, (top + row) as f32, width as f32, 1.0) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let mut outline = Paint::default();
    outline.set_color(Color::BLACK.to_skia());
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    if let Some(rect) = Rect::from_xywh(x as f32, top as f32, width as f32, height as f32) {
        let path = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&path, &outline, &stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 100, 100).unwrap()
    }

    #[test]
    fn test_new_canvas_is_white() {
        let canvas = MapCanvas::new(viewport()).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(canvas.pixel(99, 99), Some(Color::WHITE));
        assert_eq!(canvas.pixel(100, 0), None);
    }

    #[test]
    fn test_elevation_layer_shape_checked() {
        let values = vec![0.0f32; 5];
        let extent = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(matches!(
            ElevationLayer::new(&values, 2, 2, extent),
            Err(RenderError::ShapeMismatch { expected: 4, actual: 5 })
        ));
    }

    #[test]
    fn test_elevation_nan_cells_leave_background() {
        // 2x2 grid over the whole viewport: NaN in the top-left cell
        let values = [f32::NAN, 0.0, 0.0, 100.0];
        let layer = ElevationLayer::new(&values, 2, 2, BoundingBox::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut canvas = MapCanvas::new(viewport()).unwrap();
        canvas.draw_elevation(&layer, Colormap::Gray, 1.0).unwrap();

        assert_eq!(canvas.pixel(25, 25), Some(Color::WHITE));
        assert_eq!(canvas.pixel(75, 25), Some(Color::BLACK));
        assert_eq!(canvas.pixel(75, 75), Some(Color::WHITE));
        assert_eq!(canvas.pixel(25, 75), Some(Color::BLACK));
    }

    #[test]
    fn test_elevation_alpha_blends_over_white() {
        let values = [0.0f32, 1.0];
        let layer = ElevationLayer::new(&values, 2, 1, BoundingBox::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let mut canvas = MapCanvas::new(viewport()).unwrap();
        canvas.draw_elevation(&layer, Colormap::Gray, 0.5).unwrap();

        let blended = canvas.pixel(25, 50).unwrap();
        assert_eq!(blended.a, 255);
        assert!((blended.r as i32 - 127).abs() <= 2, "got {:?}", blended);
    }

    #[test]
    fn test_points_are_drawn_and_offscreen_skipped() {
        let mut canvas = MapCanvas::new(viewport()).unwrap();
        let red = Color::rgb(255, 0, 0);
        let style = PointStyle {
            radius: 3.0,
            alpha: 1.0,
        };
        let drawn = canvas.draw_points([(5.0, 5.0), (50.0, 50.0)], red, style);
        assert_eq!(drawn, 1);
        assert_eq!(canvas.pixel(50, 50), Some(red));
        assert_eq!(canvas.pixel(10, 10), Some(Color::WHITE));
    }

    #[test]
    fn test_rings_are_stroked() {
        let mut canvas = MapCanvas::new(viewport()).unwrap();
        let ring = [(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0)];
        canvas.draw_rings([&ring[..]], Color::BLACK, 2.0);

        // Left edge at x = 20 px, interior untouched
        let edge = canvas.pixel(20, 50).unwrap();
        assert!(edge.r < 64, "edge {:?}", edge);
        assert_eq!(canvas.pixel(50, 50), Some(Color::WHITE));
    }

    #[test]
    fn test_finish_adds_colorbars() {
        let canvas = MapCanvas::new(viewport()).unwrap();
        let bars = [ColorBar::new(Colormap::Gray, 1.0), ColorBar::new(Colormap::Oranges, 1.0)];
        let image = canvas.finish(&bars, 10, 5).unwrap();
        assert_eq!(image.width(), 100 + 2 * (5 + 10) + 5);
        assert_eq!(image.height(), 100);

        // First bar: black at the bottom, white at the top
        let bottom = image.pixel(110, 93).unwrap();
        let top = image.pixel(110, 6).unwrap();
        assert!(bottom.r < 20, "bottom {:?}", bottom);
        assert!(top.r > 235, "top {:?}", top);
    }
}
