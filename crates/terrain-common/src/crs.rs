//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known CRS codes supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    /// Romanian Stereo70 (Pulkovo 1942(58) / Stereo70), meters
    #[serde(rename = "EPSG:3844")]
    Epsg3844,
    /// Web Mercator (meters)
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    /// - "urn:ogc:def:crs:EPSG::3844" (the form GeoJSON `crs` members use)
    /// - "urn:ogc:def:crs:OGC:1.3:CRS84"
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        let code = if let Some(rest) = normalized.strip_prefix("URN:OGC:DEF:CRS:") {
            match rest {
                "OGC:1.3:CRS84" | "OGC::CRS84" => return Ok(CrsCode::Epsg4326),
                // EPSG::3844 or EPSG:6.6:3844 -> the code is the last segment
                _ => rest.rsplit(':').next().unwrap_or(rest),
            }
        } else if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        } else {
            normalized.strip_prefix("EPSG:").unwrap_or(&normalized)
        };

        code.parse::<u32>()
            .ok()
            .and_then(Self::from_epsg)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Code for a numeric EPSG identifier, if supported.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(CrsCode::Epsg4326),
            3844 => Some(CrsCode::Epsg3844),
            3857 | 900913 => Some(CrsCode::Epsg3857),
            _ => None,
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3844 => 3844,
            CrsCode::Epsg3857 => 3857,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3844").unwrap(), CrsCode::Epsg3844);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("3857").unwrap(), CrsCode::Epsg3857);
        assert!(CrsCode::parse("EPSG:99999").is_err());
    }

    #[test]
    fn test_parse_urn() {
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG::3844").unwrap(),
            CrsCode::Epsg3844
        );
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            CrsCode::Epsg4326
        );
    }

    #[test]
    fn test_from_epsg() {
        assert_eq!(CrsCode::from_epsg(3844), Some(CrsCode::Epsg3844));
        assert_eq!(CrsCode::from_epsg(900913), Some(CrsCode::Epsg3857));
        assert_eq!(CrsCode::from_epsg(32635), None);
    }

    #[test]
    fn test_display_roundtrip() {
        for code in [CrsCode::Epsg4326, CrsCode::Epsg3844, CrsCode::Epsg3857] {
            assert_eq!(CrsCode::parse(&code.to_string()).unwrap(), code);
        }
    }
}
