//! Per-bear tracks and the math the track maps need.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use terrain_common::BoundingBox;

use crate::observation::Observation;

/// Padding applied around a track's extent when zooming to it.
pub const ZOOM_FACTOR: f64 = 1.25;

/// Smallest zoom extent, in degrees, for tracks that never move.
pub const MIN_ZOOM_SPAN: f64 = 0.01;

/// Number of dated ticks on a progression color bar.
pub const DATE_TICKS: usize = 4;

/// A labelled position along a track's progression.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTick {
    /// Index into the sorted observations.
    pub index: usize,
    /// Progression value at that index, in [0, 1].
    pub progression: f64,
    /// `YYYY-MM-DD`
    pub label: String,
}

/// One bear's fixes, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub bear: String,
    pub observations: Vec<Observation>,
}

impl Track {
    /// Build a track, sorting the fixes by timestamp. Ties keep input order.
    pub fn new(bear: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self {
            bear: bear.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.observations.iter().map(Observation::position)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.observations.iter().map(|o| o.timestamp)
    }

    /// Extent of the fixes.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.positions())
    }

    /// The extent scaled by `factor` around its center.
    ///
    /// Each axis spans at least [`MIN_ZOOM_SPAN`] so single-fix tracks still
    /// get a drawable view.
    pub fn zoom_extent(&self, factor: f64) -> Option<BoundingBox> {
        let scaled = self.bbox()?.scaled(factor);
        let (cx, cy) = scaled.center();
        let half_w = scaled.width().max(MIN_ZOOM_SPAN) / 2.0;
        let half_h = scaled.height().max(MIN_ZOOM_SPAN) / 2.0;
        Some(BoundingBox::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h))
    }

    /// Progression of each fix: evenly spaced from 0 (first) to 1 (last).
    pub fn progression(&self) -> Vec<f64> {
        linspace(0.0, 1.0, self.len())
    }

    /// `n_ticks` evenly spaced fix indices from first to last, truncated.
    pub fn tick_indices(&self, n_ticks: usize) -> Vec<usize> {
        if self.is_empty() {
            return Vec::new();
        }
        linspace(0.0, (self.len() - 1) as f64, n_ticks)
            .into_iter()
            .map(|v| v as usize)
            .collect()
    }

    /// Date labels for a progression color bar.
    pub fn date_ticks(&self, n_ticks: usize) -> Vec<DateTick> {
        let progression = self.progression();
        self.tick_indices(n_ticks)
            .into_iter()
            .map(|index| DateTick {
                index,
                progression: progression[index],
                label: self.observations[index].timestamp.format("%Y-%m-%d").to_string(),
            })
            .collect()
    }
}

/// All tracks of a telemetry file, in order of each bear's first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BearTracks {
    pub tracks: Vec<Track>,
}

impl BearTracks {
    /// Group observations by bear.
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Observation>> = HashMap::new();

        for obs in observations {
            if !groups.contains_key(&obs.bear) {
                order.push(obs.bear.clone());
            }
            groups.entry(obs.bear.clone()).or_default().push(obs);
        }

        let tracks = order
            .into_iter()
            .filter_map(|bear| {
                let observations = groups.remove(&bear)?;
                Some(Track::new(bear, observations))
            })
            .collect();

        Self { tracks }
    }

    /// Number of bears.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn observation_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    pub fn bears(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.bear.as_str())
    }

    pub fn get(&self, bear: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.bear == bear)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Extent over every fix.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.tracks.iter().flat_map(Track::positions))
    }
}

impl<'a> IntoIterator for &'a BearTracks {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// The last value is exactly `stop`; a single value is `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + i as f64 * step })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn obs(bear: &str, day: u32, lon: f64, lat: f64) -> Observation {
        let ts = NaiveDate::from_ymd_opt(2021, 6, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Observation::new(bear, ts, lon, lat)
    }

    #[test]
    fn test_grouping_keeps_first_appearance_order() {
        let tracks = BearTracks::from_observations(vec![
            obs("Ursu", 3, 25.0, 46.0),
            obs("Martina", 1, 24.0, 45.0),
            obs("Ursu", 1, 25.1, 46.1),
            obs("Bruno", 2, 23.0, 47.0),
        ]);
        let bears: Vec<&str> = tracks.bears().collect();
        assert_eq!(bears, vec!["Ursu", "Martina", "Bruno"]);
        assert_eq!(tracks.observation_count(), 4);

        let ursu = tracks.get("Ursu").unwrap();
        assert_eq!(ursu.observations[0].position(), (25.1, 46.1));
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let track = Track::new(
            "A",
            vec![obs("A", 2, 1.0, 0.0), obs("A", 1, 2.0, 0.0), obs("A", 2, 3.0, 0.0)],
        );
        let lons: Vec<f64> = track.positions().map(|(x, _)| x).collect();
        assert_eq!(lons, vec![2.0, 1.0, 3.0]);
    }

    #[test]
    fn test_zoom_extent() {
        let track = Track::new("A", vec![obs("A", 1, 24.0, 45.0), obs("A", 2, 26.0, 46.0)]);
        let zoom = track.zoom_extent(ZOOM_FACTOR).unwrap();
        assert_relative_eq!(zoom.min_x, 23.75);
        assert_relative_eq!(zoom.max_x, 26.25);
        assert_relative_eq!(zoom.min_y, 44.875);
        assert_relative_eq!(zoom.max_y, 46.125);
    }

    #[test]
    fn test_single_fix_zoom_has_minimum_span() {
        let track = Track::new("A", vec![obs("A", 1, 25.0, 46.0)]);
        let zoom = track.zoom_extent(ZOOM_FACTOR).unwrap();
        assert_relative_eq!(zoom.width(), MIN_ZOOM_SPAN);
        assert_relative_eq!(zoom.height(), MIN_ZOOM_SPAN);
        assert_relative_eq!(zoom.min_x, 25.0 - MIN_ZOOM_SPAN / 2.0);
    }

    #[test]
    fn test_progression_and_ticks() {
        let track = Track::new("A", (1..=10).map(|d| obs("A", d, 0.0, 0.0)).collect());
        let progression = track.progression();
        assert_eq!(progression.len(), 10);
        assert_eq!(progression[0], 0.0);
        assert_eq!(progression[9], 1.0);

        assert_eq!(track.tick_indices(DATE_TICKS), vec![0, 3, 6, 9]);

        let ticks = track.date_ticks(DATE_TICKS);
        assert_eq!(ticks[0].label, "2021-06-01");
        assert_eq!(ticks[3].label, "2021-06-10");
        assert_relative_eq!(ticks[1].progression, 1.0 / 3.0);
    }

    #[test]
    fn test_tick_indices_truncate() {
        let track = Track::new("A", (1..=6).map(|d| obs("A", d, 0.0, 0.0)).collect());
        // linspace(0, 5, 4) = [0, 1.67, 3.33, 5]
        assert_eq!(track.tick_indices(4), vec![0, 1, 3, 5]);

        let single = Track::new("B", vec![obs("B", 1, 0.0, 0.0)]);
        assert_eq!(single.tick_indices(4), vec![0, 0, 0, 0]);
        assert_eq!(single.progression(), vec![0.0]);
    }

    #[test]
    fn test_linspace_edges() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
    }
}
