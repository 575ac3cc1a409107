//! A single GPS fix.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// One bear position in WGS84.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub bear: String,
    pub timestamp: NaiveDateTime,
    pub lon: f64,
    pub lat: f64,
}

impl Observation {
    pub fn new(bear: impl Into<String>, timestamp: NaiveDateTime, lon: f64, lat: f64) -> Self {
        Self {
            bear: bear.into(),
            timestamp,
            lon,
            lat,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lon, self.lat)
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a telemetry timestamp.
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DD HH:MM:SS[.f]`,
/// the same with a `T` separator, and bare dates (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2021-06-01 12:30:00"), Some(at(2021, 6, 1, 12, 30, 0)));
        assert_eq!(parse_timestamp("2021-06-01T12:30:00"), Some(at(2021, 6, 1, 12, 30, 0)));
        assert_eq!(parse_timestamp("2021-06-01"), Some(at(2021, 6, 1, 0, 0, 0)));
        assert_eq!(
            parse_timestamp("2021-06-01T14:30:00+02:00"),
            Some(at(2021, 6, 1, 12, 30, 0))
        );

        let fractional = parse_timestamp("2021-06-01 12:30:00.250").unwrap();
        assert_eq!(fractional.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2021-13-01"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}
