//! Configuration for telemetry loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use terrain_common::CrsCode;

/// Where the bear CSV lives and which CRS its `X`/`Y` columns use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Telemetry CSV with `X`, `Y`, `Name` and `timestamp` columns.
    pub csv_path: PathBuf,

    /// CRS of the `X`/`Y` columns.
    pub source_crs: CrsCode,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("../data/bears/1_bears_RO.csv"),
            source_crs: CrsCode::Epsg3844,
        }
    }
}

impl TrackingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Override fields with any tracking variables present in the environment.
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("BEARS_CSV") {
            self.csv_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("BEARS_CRS") {
            if let Ok(crs) = CrsCode::parse(&val) {
                self.source_crs = crs;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.csv_path.as_os_str().is_empty() {
            return Err("csv_path must be set".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackingConfig::default();
        assert_eq!(config.source_crs, CrsCode::Epsg3844);
        assert!(config.csv_path.ends_with("1_bears_RO.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_path_is_invalid() {
        let config = TrackingConfig {
            csv_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
