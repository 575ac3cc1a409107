//! Synthetic GeoTIFF writer.
//!
//! Writes single-band int16 rasters with ModelPixelScale/ModelTiepoint
//! georeferencing, a GeoKeyDirectory naming the EPSG code, and an optional
//! GDAL_NODATA tag, which is the layout of the WorldClim elevation product.
//! The encoder only writes strips; tiled layouts are covered by unit tests
//! on the chunk copy in `grid-processor`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tiff::TiffResult;

/// Georeferencing and layout of a synthetic raster.
#[derive(Debug, Clone, Copy)]
pub struct GeoTiffSpec {
    pub width: u32,
    pub height: u32,
    /// Longitude of the left edge.
    pub west: f64,
    /// Latitude of the top edge.
    pub north: f64,
    /// Square pixel size in degrees.
    pub pixel_size: f64,
    pub nodata: Option<i16>,
    /// Strip height; small values exercise multi-strip windowed reads.
    pub rows_per_strip: u32,
    /// EPSG code written to the GeoKeyDirectory; `None` omits the directory.
    pub epsg: Option<u16>,
}

impl GeoTiffSpec {
    pub fn new(width: u32, height: u32, west: f64, north: f64, pixel_size: f64) -> Self {
        Self {
            width,
            height,
            west,
            north,
            pixel_size,
            nodata: Some(-32768),
            rows_per_strip: 8,
            epsg: Some(4326),
        }
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn with_nodata(mut self, nodata: Option<i16>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = rows;
        self
    }
}

/// Write `samples` (row-major, `width * height` long) as a GeoTIFF at `path`.
pub fn write_geotiff(path: &Path, spec: &GeoTiffSpec, samples: &[i16]) -> TiffResult<()> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::GrayI16>(spec.width, spec.height)?;
    image.rows_per_strip(spec.rows_per_strip.max(1))?;

    {
        let dir = image.encoder();
        dir.write_tag(
            Tag::ModelPixelScaleTag,
            &[spec.pixel_size, spec.pixel_size, 0.0][..],
        )?;
        dir.write_tag(
            Tag::ModelTiepointTag,
            &[0.0, 0.0, 0.0, spec.west, spec.north, 0.0][..],
        )?;
        if let Some(epsg) = spec.epsg {
            dir.write_tag(Tag::GeoKeyDirectoryTag, &geo_key_directory(epsg)[..])?;
        }
        if let Some(nodata) = spec.nodata {
            let text = nodata.to_string();
            dir.write_tag(Tag::GdalNodata, text.as_str())?;
        }
    }

    image.write_data(samples)
}

/// Minimal GeoKeyDirectory: model type, PixelIsArea, and the CRS key.
fn geo_key_directory(epsg: u16) -> Vec<u16> {
    // 4326 is geographic; every other supported code is projected
    let (model_type, crs_key) = if epsg == 4326 { (2, 2048) } else { (1, 3072) };
    vec![
        1, 1, 0, 3, // version, revision, minor revision, key count
        1024, 0, 1, model_type, // GTModelTypeGeoKey
        1025, 0, 1, 1, // GTRasterTypeGeoKey
        crs_key, 0, 1, epsg,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_elevation_samples;

    #[test]
    fn test_write_geotiff_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.tif");
        let spec = GeoTiffSpec::new(12, 7, 20.0, 48.0, 0.5);

        write_geotiff(&path, &spec, &create_elevation_samples(12, 7)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"II*\0"), "little-endian TIFF header");
        assert!(bytes.len() > 12 * 7 * 2);
    }

    #[test]
    fn test_geo_key_directory_layout() {
        let keys = geo_key_directory(3844);
        assert_eq!(keys.len(), 4 + 3 * 4);
        assert_eq!(keys[3], 3);
        assert_eq!(&keys[4..8], &[1024, 0, 1, 1]);
        assert_eq!(&keys[12..], &[3072, 0, 1, 3844]);
        assert_eq!(&geo_key_directory(4326)[12..], &[2048, 0, 1, 4326]);
    }
}
