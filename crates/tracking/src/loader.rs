//! Bear telemetry CSV loading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use projection::Transformer;
use serde::Deserialize;
use terrain_common::CrsCode;
use tracing::{debug, info};

use crate::error::{Result, TrackingError};
use crate::observation::{parse_timestamp, Observation};
use crate::track::BearTracks;

/// Columns every telemetry file must have. Others are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["X", "Y", "Name", "timestamp"];

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "X")]
    x: f64,
    #[serde(rename = "Y")]
    y: f64,
    #[serde(rename = "Name")]
    name: String,
    timestamp: String,
}

/// Load, reproject to EPSG:4326 and group the fixes in `path`.
pub fn load_tracks(path: &Path, source_crs: CrsCode) -> Result<BearTracks> {
    let observations = load_observations(path, source_crs)?;
    if observations.is_empty() {
        return Err(TrackingError::Empty(path.display().to_string()));
    }

    let tracks = BearTracks::from_observations(observations);
    info!(
        path = %path.display(),
        bears = tracks.len(),
        observations = tracks.observation_count(),
        "Loaded bear tracks"
    );
    Ok(tracks)
}

/// Load every fix in `path`, in file order, as WGS84 positions.
pub fn load_observations(path: &Path, source_crs: CrsCode) -> Result<Vec<Observation>> {
    let file = File::open(path)
        .map_err(|e| TrackingError::read_failed(format!("{}: {}", path.display(), e)))?;
    read_observations(file, source_crs)
}

/// Parse telemetry CSV from any reader.
pub fn read_observations<R: Read>(reader: R, source_crs: CrsCode) -> Result<Vec<Observation>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(TrackingError::MissingColumn(column.to_string()));
        }
    }

    let transformer = Transformer::new(source_crs, CrsCode::Epsg4326);
    let mut observations = Vec::new();

    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let record: Record = row.deserialize(Some(&headers))?;

        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| {
            TrackingError::InvalidTimestamp {
                line,
                value: record.timestamp.clone(),
            }
        })?;
        let (lon, lat) = transformer.transform(record.x, record.y)?;

        observations.push(Observation::new(record.name, timestamp, lon, lat));
    }

    debug!(
        rows = observations.len(),
        from = %source_crs,
        "Parsed telemetry rows"
    );
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_read_wgs84_rows() {
        let csv = "Name,timestamp,X,Y,extra\nA,2021-06-01,25.5,45.5,x\nB,2021-06-02 10:00:00,26.0,46.0,y\n";
        let obs = read_observations(csv.as_bytes(), CrsCode::Epsg4326).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].bear, "A");
        assert_eq!(obs[1].position(), (26.0, 46.0));
    }

    #[test]
    fn test_stereo70_rows_are_reprojected() {
        let csv = "X,Y,Name,timestamp\n500000,500000,A,2021-06-01\n";
        let obs = read_observations(csv.as_bytes(), CrsCode::Epsg3844).unwrap();
        // The Stereo70 false origin lies near 25E 46N
        assert_abs_diff_eq!(obs[0].lon, 25.0, epsilon = 0.01);
        assert_abs_diff_eq!(obs[0].lat, 46.0, epsilon = 0.01);
    }

    #[test]
    fn test_missing_column() {
        let csv = "X,Y,timestamp\n1,2,2021-06-01\n";
        let err = read_observations(csv.as_bytes(), CrsCode::Epsg4326).unwrap_err();
        assert!(matches!(err, TrackingError::MissingColumn(ref c) if c == "Name"));
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let csv = "X,Y,Name,timestamp\n1,2,A,2021-06-01\n1,2,A,soon\n";
        let err = read_observations(csv.as_bytes(), CrsCode::Epsg4326).unwrap_err();
        match err {
            TrackingError::InvalidTimestamp { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_is_csv_error() {
        let csv = "X,Y,Name,timestamp\nabc,2,A,2021-06-01\n";
        assert!(matches!(
            read_observations(csv.as_bytes(), CrsCode::Epsg4326),
            Err(TrackingError::Csv { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_observations(Path::new("/nonexistent/1_bears_RO.csv"), CrsCode::Epsg3844)
            .unwrap_err();
        assert!(matches!(err, TrackingError::ReadFailed(_)));
    }
}
