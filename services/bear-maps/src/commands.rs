//! The three subcommands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use grid_processor::{Boundary, ExtractionPipeline, GridCache};
use renderer::{render_all_bears, render_track, track_file_name, ElevationLayer, MapLayers};
use terrain_common::CrsCode;
use tracing::info;
use tracking::{load_tracks, BearTracks};

use crate::config::AppConfig;

/// Clip the raster and write the grid cache.
pub fn extract(config: &AppConfig) -> Result<()> {
    let summary = ExtractionPipeline::new(config.extract.clone())
        .run()
        .context("Elevation extraction failed")?;

    info!(
        cache = %summary.cache_path.display(),
        rows = summary.shape.0,
        cols = summary.shape.1,
        missing = summary.missing,
        elevation_range = ?summary.elevation_range,
        bytes = summary.bytes_written,
        "Grid cache written"
    );
    Ok(())
}

/// Every bear over the terrain background.
pub fn map_all(config: &AppConfig) -> Result<()> {
    let inputs = MapInputs::load(config)?;
    let layers = inputs.layers()?;

    let image = render_all_bears(&layers, &inputs.tracks, &config.render.style)
        .context("Failed to render all-bears map")?;

    let path = config.render.all_bears_path();
    image
        .save_png(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    info!(path = %path.display(), bears = inputs.tracks.len(), "Saved all-bears map");
    Ok(())
}

/// One map per bear, or only `only` when given.
pub fn map_tracks(config: &AppConfig, only: Option<&str>) -> Result<()> {
    let inputs = MapInputs::load(config)?;
    let layers = inputs.layers()?;
    let out_dir = config.render.tracks_dir();

    let mut written = 0;
    for track in inputs.tracks.iter() {
        if only.is_some_and(|bear| bear != track.bear) {
            continue;
        }
        info!(bear = %track.bear, fixes = track.len(), "Rendering track");

        let image = render_track(&layers, track, &config.render.style)
            .with_context(|| format!("Failed to render track of {}", track.bear))?;
        let path = out_dir.join(track_file_name(&track.bear));
        image
            .save_png(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        written += 1;
    }

    if let Some(bear) = only {
        if written == 0 {
            bail!("No bear named '{}' in {}", bear, config.tracking.csv_path.display());
        }
    }
    info!(dir = %out_dir.display(), maps = written, "Saved track maps");
    Ok(())
}

/// Everything a map is drawn from.
struct MapInputs {
    cache: GridCache,
    boundary: Boundary,
    tracks: BearTracks,
}

impl MapInputs {
    fn load(config: &AppConfig) -> Result<Self> {
        let cache_path = config.map_cache_path();
        let cache = open_cache(&cache_path)?;

        let boundary = Boundary::load_reprojected(&config.extract.boundary_path, CrsCode::Epsg4326)
            .with_context(|| {
                format!(
                    "Failed to load boundary {}",
                    config.extract.boundary_path.display()
                )
            })?;

        let tracks = load_tracks(&config.tracking.csv_path, config.tracking.source_crs)
            .with_context(|| {
                format!(
                    "Failed to load bear tracks {}",
                    config.tracking.csv_path.display()
                )
            })?;

        Ok(Self {
            cache,
            boundary,
            tracks,
        })
    }

    fn layers(&self) -> Result<MapLayers<'_>> {
        let grid = self
            .cache
            .elevation()
            .context("Failed to read cached elevation")?;
        let extent = self
            .cache
            .extent()
            .context("Failed to read cached coordinates")?;
        let elevation = ElevationLayer::new(&grid.data, grid.width, grid.height, extent)?;

        Ok(MapLayers::new(
            elevation,
            self.boundary.rings().map(|ring| ring.as_slice()),
        ))
    }
}

fn open_cache(path: &Path) -> Result<GridCache> {
    let cache = GridCache::open(path)
        .with_context(|| format!("Failed to open grid cache {} (run `extract` first)", path.display()))?;

    let crs = cache.metadata().crs;
    if crs != CrsCode::Epsg4326 {
        bail!("Grid cache {} is in {}, maps need EPSG:4326", path.display(), crs);
    }
    Ok(cache)
}
