//! Windowed GeoTIFF reading.
//!
//! Only the strips or tiles that overlap a requested window are decoded,
//! so clipping a country out of a global 30 arc-second raster never loads
//! the whole file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use num_traits::ToPrimitive;
use terrain_common::{CrsCode, GeoTransform, PixelWindow};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, info, warn};

use crate::error::{GridProcessorError, Result};

/// A georeferenced single-band raster that supports windowed reads.
pub trait RasterSource {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn transform(&self) -> GeoTransform;

    /// Sentinel marking missing samples, if the raster declares one.
    fn nodata(&self) -> Option<f64>;

    fn crs(&self) -> CrsCode;

    /// Read `window` as f64 samples, row-major.
    ///
    /// The window must already be clamped to the raster.
    fn read_window(&mut self, window: &PixelWindow) -> Result<Vec<f64>>;
}

/// A single-band GeoTIFF opened for windowed reads.
pub struct GeoTiffRaster {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    width: usize,
    height: usize,
    chunk_width: usize,
    chunk_height: usize,
    transform: GeoTransform,
    nodata: Option<f64>,
    crs: CrsCode,
}

impl std::fmt::Debug for GeoTiffRaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoTiffRaster")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.transform)
            .field("nodata", &self.nodata)
            .field("crs", &self.crs)
            .finish()
    }
}

impl GeoTiffRaster {
    /// Open a raster and read its georeferencing tags.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| GridProcessorError::raster_read(format!("{}: {}", path.display(), e)))?;

        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| GridProcessorError::raster_read(format!("{}: {}", path.display(), e)))?;

        // Strips of a global raster can be large
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 64 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let transform = read_geotransform(&mut decoder)?;
        let nodata = read_nodata(&mut decoder);
        let crs = read_crs(&mut decoder)?;

        if nodata.is_none() {
            warn!(path = %path.display(), "Raster has no GDAL_NODATA tag; no cell will be masked as nodata");
        }

        info!(
            path = %path.display(),
            width,
            height,
            chunk_width,
            chunk_height,
            layout = if chunk_width == width { "stripped" } else { "tiled" },
            nodata = ?nodata,
            %crs,
            "Opened raster"
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            width: width as usize,
            height: height as usize,
            chunk_width: chunk_width.max(1) as usize,
            chunk_height: chunk_height.max(1) as usize,
            transform,
            nodata,
            crs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn layout(&self) -> ChunkLayout {
        ChunkLayout {
            width: self.width,
            height: self.height,
            chunk_width: self.chunk_width,
            chunk_height: self.chunk_height,
        }
    }
}

impl RasterSource for GeoTiffRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn crs(&self) -> CrsCode {
        self.crs
    }

    fn read_window(&mut self, window: &PixelWindow) -> Result<Vec<f64>> {
        let clamped = window.clamp_to(self.width, self.height)?;
        if clamped != *window {
            return Err(GridProcessorError::WindowOutOfBounds(format!(
                "{:?} exceeds {}x{} raster",
                window, self.width, self.height
            )));
        }

        let layout = self.layout();
        let chunks = layout.chunks_overlapping(window);
        debug!(?window, chunks = chunks.len(), "Reading raster window");

        let mut out = vec![f64::NAN; window.width * window.height];
        for chunk in chunks {
            let index = layout.index(chunk);
            let (data_width, data_height) = self.decoder.chunk_data_dimensions(index);
            let samples = self
                .decoder
                .read_chunk(index)
                .map(samples_to_f64)
                .map_err(|e| GridProcessorError::raster_read(format!("chunk {}: {}", index, e)))?;

            copy_chunk(
                &samples,
                layout.origin(chunk),
                (data_width as usize, data_height as usize),
                window,
                &mut out,
            )?;
        }

        Ok(out)
    }
}

/// Strip or tile grid of a TIFF image. Strips are tiles as wide as the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkLayout {
    width: usize,
    height: usize,
    chunk_width: usize,
    chunk_height: usize,
}

impl ChunkLayout {
    fn chunks_across(&self) -> usize {
        self.width.div_ceil(self.chunk_width)
    }

    /// (chunk row, chunk col) of every chunk a clamped, non-empty window touches.
    fn chunks_overlapping(&self, window: &PixelWindow) -> Vec<(usize, usize)> {
        let rows = window.row_range();
        let cols = window.col_range();
        if rows.is_empty() || cols.is_empty() {
            return Vec::new();
        }
        let chunk_rows = rows.start / self.chunk_height..=(rows.end - 1) / self.chunk_height;
        let chunk_cols = cols.start / self.chunk_width..=(cols.end - 1) / self.chunk_width;
        chunk_rows
            .flat_map(|r| chunk_cols.clone().map(move |c| (r, c)))
            .collect()
    }

    /// Chunk index in the file, row-major.
    fn index(&self, (chunk_row, chunk_col): (usize, usize)) -> u32 {
        (chunk_row * self.chunks_across() + chunk_col) as u32
    }

    /// Pixel (x, y) of a chunk's upper-left sample.
    fn origin(&self, (chunk_row, chunk_col): (usize, usize)) -> (usize, usize) {
        (chunk_col * self.chunk_width, chunk_row * self.chunk_height)
    }
}

/// Copy the part of a decoded chunk that falls inside `window` into `out`.
///
/// `samples` holds `data_width * data_height` values with a row stride of
/// `data_width`: edge tiles arrive with their padding already cropped.
fn copy_chunk(
    samples: &[f64],
    (chunk_x0, chunk_y0): (usize, usize),
    (data_width, data_height): (usize, usize),
    window: &PixelWindow,
    out: &mut [f64],
) -> Result<()> {
    let rows = window.row_range();
    let cols = window.col_range();

    let row_start = rows.start.max(chunk_y0);
    let row_end = rows.end.min(chunk_y0 + data_height);
    let col_start = cols.start.max(chunk_x0);
    let col_end = cols.end.min(chunk_x0 + data_width);
    if row_start >= row_end || col_start >= col_end {
        return Ok(());
    }
    let len = col_end - col_start;

    for row in row_start..row_end {
        let src = (row - chunk_y0) * data_width + (col_start - chunk_x0);
        let dst = (row - rows.start) * window.width + (col_start - cols.start);
        let src_row = samples.get(src..src + len).ok_or_else(|| {
            GridProcessorError::raster_read(format!(
                "chunk at ({}, {}) is truncated",
                chunk_x0, chunk_y0
            ))
        })?;
        out[dst..dst + len].copy_from_slice(src_row);
    }
    Ok(())
}

/// An in-memory raster, used where samples are already loaded.
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    samples: Vec<f64>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f64>,
    crs: CrsCode,
}

impl MemoryRaster {
    /// Row-major `samples`, `width * height` long, in EPSG:4326.
    pub fn new(
        samples: Vec<f64>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
    ) -> Self {
        Self {
            samples,
            width,
            height,
            transform,
            nodata,
            crs: CrsCode::Epsg4326,
        }
    }

    pub fn with_crs(mut self, crs: CrsCode) -> Self {
        self.crs = crs;
        self
    }
}

impl RasterSource for MemoryRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn transform(&self) -> GeoTransform {
        self.transform
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn crs(&self) -> CrsCode {
        self.crs
    }

    fn read_window(&mut self, window: &PixelWindow) -> Result<Vec<f64>> {
        let clamped = window.clamp_to(self.width, self.height)?;
        if clamped != *window || self.samples.len() != self.width * self.height {
            return Err(GridProcessorError::WindowOutOfBounds(format!(
                "{:?} exceeds {}x{} raster",
                window, self.width, self.height
            )));
        }

        let cols = window.col_range();
        let mut out = Vec::with_capacity(window.width * window.height);
        for row in window.row_range() {
            let start = row * self.width;
            out.extend_from_slice(&self.samples[start + cols.start..start + cols.end]);
        }
        Ok(out)
    }
}

/// Build the affine transform from ModelTransformation (34264), or from
/// ModelPixelScale (33550) + ModelTiepoint (33922).
fn read_geotransform<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 8 {
            return Ok(GeoTransform::new(m[0], m[1], m[3], m[4], m[5], m[7]));
        }
    }

    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let pixel_scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);

    match (tiepoint, pixel_scale) {
        (Ok(tie), Ok(scale)) if tie.len() >= 6 && scale.len() >= 2 => {
            // Tiepoint (i, j) -> (x, y); usually the upper-left corner (0, 0)
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            let (sx, sy) = (scale[0], scale[1]);
            Ok(GeoTransform::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
        }
        _ => Err(GridProcessorError::raster_read(
            "raster has no ModelTransformation or ModelPixelScale/ModelTiepoint tags",
        )),
    }
}

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const MODEL_TYPE_PROJECTED: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// CRS named by the GeoKeyDirectory (34735). Rasters without one are taken
/// as EPSG:4326.
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<CrsCode> {
    match decoder.find_tag(Tag::GeoKeyDirectoryTag)? {
        Some(value) => crs_from_geo_keys(&value.into_u16_vec()?),
        None => {
            warn!("Raster has no GeoKeyDirectory; assuming EPSG:4326");
            Ok(CrsCode::Epsg4326)
        }
    }
}

/// Resolve the EPSG code from GeoKey entries `[id, location, count, value]`.
fn crs_from_geo_keys(directory: &[u16]) -> Result<CrsCode> {
    if directory.len() < 4 {
        return Err(GridProcessorError::raster_read("GeoKeyDirectory is truncated"));
    }
    let key_count = directory[3] as usize;

    let mut model_type = None;
    let mut geographic = None;
    let mut projected = None;
    for key in directory[4..].chunks_exact(4).take(key_count) {
        // Location 0 means the value is stored inline
        if key[1] != 0 {
            continue;
        }
        match key[0] {
            GT_MODEL_TYPE_GEO_KEY => model_type = Some(key[3]),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(key[3]),
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(key[3]),
            _ => {}
        }
    }

    let code = match model_type {
        Some(MODEL_TYPE_PROJECTED) => projected,
        Some(_) => geographic,
        None => projected.or(geographic),
    };
    match code {
        Some(USER_DEFINED) | None => Err(GridProcessorError::UnsupportedCrs(
            "GeoTIFF CRS is user-defined or has no EPSG key".to_string(),
        )),
        Some(code) => CrsCode::from_epsg(code as u32)
            .ok_or_else(|| GridProcessorError::UnsupportedCrs(format!("EPSG:{}", code))),
    }
}

/// GDAL_NODATA (42113) is an ASCII number, often NUL-terminated.
fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let raw = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.to_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn convert<T: ToPrimitive>(values: Vec<T>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

fn samples_to_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(v) => convert(v),
        DecodingResult::U16(v) => convert(v),
        DecodingResult::U32(v) => convert(v),
        DecodingResult::U64(v) => convert(v),
        DecodingResult::I8(v) => convert(v),
        DecodingResult::I16(v) => convert(v),
        DecodingResult::I32(v) => convert(v),
        DecodingResult::I64(v) => convert(v),
        DecodingResult::F32(v) => convert(v),
        DecodingResult::F64(v) => v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_to_f64_keeps_int16_sentinel() {
        let values = samples_to_f64(DecodingResult::I16(vec![-32768, 0, 2544]));
        assert_eq!(values, vec![-32768.0, 0.0, 2544.0]);
    }

    /// Decoded samples of one chunk of an image whose value at (row, col)
    /// is `row * 100 + col`, cropped to the image like the decoder does.
    fn decoded_chunk(layout: &ChunkLayout, chunk: (usize, usize)) -> (Vec<f64>, (usize, usize)) {
        let (x0, y0) = layout.origin(chunk);
        let data_width = layout.chunk_width.min(layout.width - x0);
        let data_height = layout.chunk_height.min(layout.height - y0);
        let samples = (0..data_height)
            .flat_map(|r| (0..data_width).map(move |c| ((y0 + r) * 100 + x0 + c) as f64))
            .collect();
        (samples, (data_width, data_height))
    }

    fn read_through_chunks(layout: &ChunkLayout, window: &PixelWindow) -> Vec<f64> {
        let mut out = vec![f64::NAN; window.width * window.height];
        for chunk in layout.chunks_overlapping(window) {
            let (samples, dims) = decoded_chunk(layout, chunk);
            copy_chunk(&samples, layout.origin(chunk), dims, window, &mut out).unwrap();
        }
        out
    }

    fn expected_window(window: &PixelWindow) -> Vec<f64> {
        window
            .row_range()
            .flat_map(|r| window.col_range().map(move |c| (r * 100 + c) as f64))
            .collect()
    }

    // 10 x 7 image in 4 x 4 tiles: the last tile column is 2 wide and the
    // last tile row is 3 tall
    const TILED: ChunkLayout = ChunkLayout {
        width: 10,
        height: 7,
        chunk_width: 4,
        chunk_height: 4,
    };

    #[test]
    fn test_tiled_chunks_overlapping_window() {
        assert_eq!(TILED.chunks_across(), 3);

        let window = PixelWindow::new(3, 2, 6, 4);
        let chunks = TILED.chunks_overlapping(&window);
        assert_eq!(chunks, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        let indices: Vec<u32> = chunks.iter().map(|&c| TILED.index(c)).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(TILED.origin((1, 2)), (8, 4));
    }

    #[test]
    fn test_tiled_window_reads_across_edge_tiles() {
        for window in [
            PixelWindow::new(0, 0, 10, 7),
            PixelWindow::new(3, 2, 6, 4),
            PixelWindow::new(7, 5, 3, 2),
            PixelWindow::new(5, 1, 2, 2),
        ] {
            let values = read_through_chunks(&TILED, &window);
            assert_eq!(values, expected_window(&window), "window {:?}", window);
        }
    }

    #[test]
    fn test_stripped_window_reads() {
        let stripped = ChunkLayout {
            width: 10,
            height: 7,
            chunk_width: 10,
            chunk_height: 3,
        };
        let window = PixelWindow::new(2, 1, 5, 6);
        assert_eq!(stripped.chunks_overlapping(&window).len(), 3);
        assert_eq!(read_through_chunks(&stripped, &window), expected_window(&window));
    }

    #[test]
    fn test_truncated_chunk_is_an_error() {
        let window = PixelWindow::new(0, 0, 4, 4);
        let mut out = vec![0.0; 16];
        let err = copy_chunk(&[1.0; 10], (0, 0), (4, 4), &window, &mut out).unwrap_err();
        assert!(matches!(err, GridProcessorError::RasterRead(_)));
    }

    #[test]
    fn test_crs_from_geo_keys() {
        let geographic = [1u16, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326];
        assert_eq!(crs_from_geo_keys(&geographic).unwrap(), CrsCode::Epsg4326);

        let stereo70 = [1u16, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 3844];
        assert_eq!(crs_from_geo_keys(&stereo70).unwrap(), CrsCode::Epsg3844);

        // No model type: the projected key wins
        let untyped = [1u16, 1, 0, 2, 2048, 0, 1, 4326, 3072, 0, 1, 3857];
        assert_eq!(crs_from_geo_keys(&untyped).unwrap(), CrsCode::Epsg3857);
    }

    #[test]
    fn test_crs_from_geo_keys_rejects_unsupported() {
        let utm = [1u16, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 32635];
        assert!(matches!(
            crs_from_geo_keys(&utm),
            Err(GridProcessorError::UnsupportedCrs(_))
        ));

        let user_defined = [1u16, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 32767];
        assert!(matches!(
            crs_from_geo_keys(&user_defined),
            Err(GridProcessorError::UnsupportedCrs(_))
        ));

        assert!(crs_from_geo_keys(&[1u16, 1]).is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let err = GeoTiffRaster::open(Path::new("/nonexistent/wc2.1_30s_elev.tif")).unwrap_err();
        assert!(matches!(err, GridProcessorError::RasterRead(_)));
    }
}
