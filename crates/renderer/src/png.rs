//! PNG encoding for map images.
//!
//! Two encodings:
//! - **Indexed (color type 3)** when the image fits a 256-color palette.
//!   Maps with flat fills, strokes and a few marker colors usually do.
//! - **RGBA (color type 6)** otherwise, e.g. under an alpha-blended
//!   elevation background.
//!
//! `create_png_auto` picks one; `create_png` always writes RGBA.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{RenderError, Result};

/// The eight bytes every PNG starts with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Images at least this many pixels build their palette in parallel.
const PARALLEL_THRESHOLD: usize = 4096;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

/// Encode RGBA pixels, indexed when at most 256 distinct colors occur.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_dimensions(pixels.len(), width, height, 4)?;

    let extracted = if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        Palette::extract_parallel(pixels)
    } else {
        Palette::extract_sequential(pixels)
    };

    match extracted {
        Some((palette, indices)) => create_png_indexed(width, height, &palette.colors, &indices),
        None => create_png(pixels, width, height),
    }
}

/// Encode RGBA pixels as color type 6.
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_dimensions(pixels.len(), width, height, 4)?;
    let idat = deflate_scanlines(pixels, width * 4)?;
    Ok(assemble(width, height, COLOR_TYPE_RGBA, &[], &idat))
}

/// Encode palette indices as color type 3. A `tRNS` chunk is added when any
/// palette entry is translucent.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 4]],
    indices: &[u8],
) -> Result<Vec<u8>> {
    check_dimensions(indices.len(), width, height, 1)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::encode(format!(
            "palette must hold 1-{} colors, got {}",
            MAX_PALETTE_SIZE,
            palette.len()
        )));
    }

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    let mut extra: Vec<(&[u8; 4], Vec<u8>)> = vec![(b"PLTE", plte)];
    if palette.iter().any(|c| c[3] < 255) {
        extra.push((b"tRNS", palette.iter().map(|c| c[3]).collect()));
    }

    let idat = deflate_scanlines(indices, width)?;
    Ok(assemble(width, height, COLOR_TYPE_INDEXED, &extra, &idat))
}

/// Distinct colors of an image in first-seen order.
#[derive(Debug, Default)]
struct Palette {
    colors: Vec<[u8; 4]>,
    index: HashMap<u32, u8>,
}

impl Palette {
    /// Add `color` if new. None once the palette would exceed 256 entries.
    fn insert(&mut self, color: [u8; 4]) -> Option<u8> {
        let key = u32::from_le_bytes(color);
        if let Some(&idx) = self.index.get(&key) {
            return Some(idx);
        }
        if self.colors.len() >= MAX_PALETTE_SIZE {
            return None;
        }
        let idx = self.colors.len() as u8;
        self.colors.push(color);
        self.index.insert(key, idx);
        Some(idx)
    }

    fn extract_sequential(pixels: &[u8]) -> Option<(Self, Vec<u8>)> {
        let mut palette = Self::default();
        let indices = pixels
            .chunks_exact(4)
            .map(|px| palette.insert([px[0], px[1], px[2], px[3]]))
            .collect::<Option<Vec<u8>>>()?;
        Some((palette, indices))
    }

    /// Collect per-chunk color sets in parallel, merge them, then map
    /// pixels to indices in parallel.
    fn extract_parallel(pixels: &[u8]) -> Option<(Self, Vec<u8>)> {
        let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

        let local_sets: Vec<HashSet<u32>> = pixels
            .par_chunks(chunk_pixels * 4)
            .map(|chunk| {
                let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
                for px in chunk.chunks_exact(4) {
                    seen.insert(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
                    if seen.len() > MAX_PALETTE_SIZE {
                        break;
                    }
                }
                seen
            })
            .collect();

        let mut palette = Self::default();
        for key in local_sets.into_iter().flatten() {
            palette.insert(key.to_le_bytes())?;
        }

        let mut indices = vec![0u8; pixels.len() / 4];
        indices
            .par_chunks_mut(chunk_pixels)
            .zip(pixels.par_chunks(chunk_pixels * 4))
            .for_each(|(out, chunk)| {
                for (idx, px) in out.iter_mut().zip(chunk.chunks_exact(4)) {
                    let key = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
                    *idx = palette.index.get(&key).copied().unwrap_or(0);
                }
            });

        Some((palette, indices))
    }
}

fn check_dimensions(len: usize, width: usize, height: usize, bytes_per_pixel: usize) -> Result<()> {
    if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
        return Err(RenderError::encode(format!("invalid image size {}x{}", width, height)));
    }
    let expected = width * height * bytes_per_pixel;
    if len != expected {
        return Err(RenderError::ShapeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Signature, IHDR, extra chunks, IDAT and IEND.
fn assemble(
    width: usize,
    height: usize,
    color_type: u8,
    extra: &[(&[u8; 4], Vec<u8>)],
    idat: &[u8],
) -> Vec<u8> {
    let mut png = Vec::with_capacity(idat.len() + 128);
    png.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth 8, then compression, filter and interlace methods 0
    ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);
    write_chunk(&mut png, b"IHDR", &ihdr);

    for (kind, data) in extra {
        write_chunk(&mut png, kind, data);
    }
    write_chunk(&mut png, b"IDAT", idat);
    write_chunk(&mut png, b"IEND", &[]);
    png
}

/// Length, type, data and CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Zlib-compress rows of `row_bytes`, each prefixed with filter type 0.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> Result<Vec<u8>> {
    compress_rows(data, row_bytes)
        .map_err(|e| RenderError::encode(format!("IDAT compression failed: {}", e)))
}

fn compress_rows(data: &[u8], row_bytes: usize) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::fast());
    for row in data.chunks_exact(row_bytes) {
        encoder.write_all(&[0])?;
        encoder.write_all(row)?;
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Width, height and color type from the IHDR chunk.
    fn ihdr(png: &[u8]) -> (u32, u32, u8) {
        assert_eq!(&png[12..16], b"IHDR");
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (width, height, png[25])
    }

    #[test]
    fn test_extract_palette_simple() {
        // 4 pixels: red, green, blue, red (3 unique colors)
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];

        let (palette, indices) = Palette::extract_sequential(&pixels).unwrap();
        assert_eq!(palette.colors.len(), 3);
        assert_eq!(indices.len(), 4);
        assert_eq!(indices[0], indices[3]); // both red pixels have same index
    }

    #[test]
    fn test_extract_palette_parallel_matches_sequential() {
        // 128x128 map-like image: white background with a few marker colors
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128 {
            for x in 0..128 {
                let color = match (x / 16 + y / 16) % 4 {
                    0 => [255, 255, 255, 255],
                    1 => [31, 119, 180, 255],
                    2 => [255, 127, 14, 255],
                    _ => [0, 0, 0, 255],
                };
                pixels.extend_from_slice(&color);
            }
        }

        let (palette, indices) = Palette::extract_parallel(&pixels).unwrap();
        assert_eq!(palette.colors.len(), 4);
        assert_eq!(indices.len(), 128 * 128);
        for (i, idx) in indices.iter().enumerate() {
            let color = palette.colors[*idx as usize];
            assert_eq!(&pixels[i * 4..i * 4 + 4], &color, "pixel {}", i);
        }
    }

    #[test]
    fn test_indexed_png_header() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 255, 0, 255, // green
            255, 0, 0, 128, // translucent red
        ];

        let png = create_png_auto(&pixels, 2, 2).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(ihdr(&png), (2, 2, 3));
        assert!(png.windows(4).any(|w| w == b"tRNS"));
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn test_rgba_fallback_over_256_colors() {
        let mut pixels = Vec::with_capacity(300 * 4);
        for i in 0..300u32 {
            pixels.extend_from_slice(&[(i % 256) as u8, (i / 256) as u8, 7, 255]);
        }

        let png = create_png_auto(&pixels, 300, 1).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(ihdr(&png), (300, 1, 6));
    }

    #[test]
    fn test_buffer_size_must_match_dimensions() {
        let pixels = [0u8; 12];
        assert!(matches!(
            create_png(&pixels, 2, 2),
            Err(RenderError::ShapeMismatch { expected: 16, actual: 12 })
        ));
        assert!(create_png_auto(&[], 0, 0).is_err());
    }

    #[test]
    fn test_indexed_smaller_for_flat_map() {
        // A mostly white 256x256 map with a stroked frame
        let mut pixels = vec![255u8; 256 * 256 * 4];
        for i in 0..256 {
            for (x, y) in [(i, 0), (i, 255), (0, i), (255, i)] {
                let idx = (y * 256 + x) * 4;
                pixels[idx..idx + 3].copy_from_slice(&[0, 0, 0]);
            }
        }

        let indexed = create_png_auto(&pixels, 256, 256).unwrap();
        let rgba = create_png(&pixels, 256, 256).unwrap();
        println!("Indexed: {} bytes, RGBA: {} bytes", indexed.len(), rgba.len());
        assert!(indexed.len() <= rgba.len());
    }
}
