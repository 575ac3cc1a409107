//! bear-maps
//!
//! Extracts the Romania elevation grid cache from a global raster and renders
//! bear GPS telemetry over it.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use grid_processor::{BoundingBox, ClipMode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "bear-maps")]
#[command(about = "Elevation maps of Romania with bear GPS tracks")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true, env = "BEAR_MAPS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clip the elevation raster and write the grid cache
    Extract {
        /// bbox or mask
        #[arg(long, value_parser = parse_clip_mode)]
        clip_mode: Option<ClipMode>,

        /// Explicit box "minx,miny,maxx,maxy" instead of the boundary extent
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,

        /// Elevation GeoTIFF
        #[arg(long)]
        raster: Option<PathBuf>,

        /// Boundary GeoJSON
        #[arg(long)]
        boundary: Option<PathBuf>,

        /// Output cache directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render every bear over the terrain map
    MapAll {
        /// Grid cache to draw
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Bear telemetry CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output image directory
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },

    /// Render one track map per bear
    MapTracks {
        /// Grid cache to draw
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Bear telemetry CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output image directory
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// Only render this bear
        #[arg(long)]
        bear: Option<String>,
    },
}

fn parse_clip_mode(s: &str) -> Result<ClipMode, String> {
    ClipMode::parse(s).ok_or_else(|| format!("unknown clip mode '{}', expected bbox or mask", s))
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_str_list(s).map_err(|e| e.to_string())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Fold command-line flags over the loaded configuration.
fn apply_overrides(config: &mut AppConfig, command: &Command) {
    match command {
        Command::Extract {
            clip_mode,
            bbox,
            raster,
            boundary,
            output,
        } => {
            if let Some(mode) = clip_mode {
                config.extract.clip_mode = *mode;
            }
            if let Some(bbox) = bbox {
                config.extract.bbox = Some(*bbox);
            }
            if let Some(raster) = raster {
                config.extract.raster_path = raster.clone();
            }
            if let Some(boundary) = boundary {
                config.extract.boundary_path = boundary.clone();
            }
            if let Some(output) = output {
                config.extract.cache_path = Some(output.clone());
            }
        }
        Command::MapAll {
            cache,
            csv,
            images_dir,
        }
        | Command::MapTracks {
            cache,
            csv,
            images_dir,
            ..
        } => {
            if let Some(cache) = cache {
                config.render.cache_path = Some(cache.clone());
            }
            if let Some(csv) = csv {
                config.tracking.csv_path = csv.clone();
            }
            if let Some(dir) = images_dir {
                config.render.images_dir = dir.clone();
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    apply_overrides(&mut config, &args.command);
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    match &args.command {
        Command::Extract { .. } => commands::extract(&config),
        Command::MapAll { .. } => commands::map_all(&config),
        Command::MapTracks { bear, .. } => commands::map_tracks(&config, bear.as_deref()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json);

    info!(command = ?args.command, "Starting bear-maps");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "bear-maps failed");
            ExitCode::FAILURE
        }
    }
}
