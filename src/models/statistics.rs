use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Per-station state the aggregation store keeps while a run is in progress.
pub trait Accumulator: Default + Send + 'static {
    fn record(&mut self, value: f32);

    /// Fold another accumulator for the same station into this one.
    fn merge(&mut self, other: Self);

    /// Reduce to min/mean/max, `None` while nothing was recorded.
    fn summarize(&self) -> Option<StationSummary>;
}

/// Final statistics for one station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationSummary {
    pub min: f32,
    pub mean: f32,
    pub max: f32,
    pub count: u64,
}

impl fmt::Display for StationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/{:.1}/{:.1}", self.min, self.mean, self.max)
    }
}

/// Running min/max/sum/count, updated in O(1) per value.
///
/// The sum is kept in f64 so long series do not drift; everything reported
/// is single precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    pub min: f32,
    pub max: f32,
    pub sum: f64,
    pub count: u64,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            sum: 0.0,
            count: 0,
        }
    }
}

impl Accumulator for RunningStats {
    fn record(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value as f64;
        self.count += 1;
    }

    fn merge(&mut self, other: Self) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    fn summarize(&self) -> Option<StationSummary> {
        if self.count == 0 {
            return None;
        }

        Some(StationSummary {
            min: self.min,
            mean: (self.sum / self.count as f64) as f32,
            max: self.max,
            count: self.count,
        })
    }
}

/// Every observed value in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSeries {
    values: Vec<f32>,
}

impl MeasurementSeries {
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl Accumulator for MeasurementSeries {
    fn record(&mut self, value: f32) {
        self.values.push(value);
    }

    fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    fn summarize(&self) -> Option<StationSummary> {
        let mut stats = RunningStats::default();
        for &value in &self.values {
            stats.record(value);
        }

        stats.summarize()
    }
}

/// Key stations by their display name.
///
/// Distinct byte keys that decode to the same lossy UTF-8 text are merged
/// rather than overwriting each other.
pub fn group_by_name<A: Accumulator>(stations: HashMap<Vec<u8>, A>) -> BTreeMap<String, A> {
    let mut grouped: BTreeMap<String, A> = BTreeMap::new();

    for (station, accumulator) in stations {
        let name = String::from_utf8_lossy(&station).into_owned();
        match grouped.get_mut(&name) {
            Some(existing) => existing.merge(accumulator),
            None => {
                grouped.insert(name, accumulator);
            }
        }
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        assert!(stats.summarize().is_none());

        for value in [10.0, 20.0, -5.5, 3.5] {
            stats.record(value);
        }

        let summary = stats.summarize().unwrap();
        assert_eq!(summary.min, -5.5);
        assert_eq!(summary.max, 20.0);
        assert_eq!(summary.mean, 7.0);
        assert_eq!(summary.count, 4);
    }

    #[test]
    fn test_series_matches_running_stats() {
        let values = [12.3, -7.1, 0.0, 45.9, 12.3];

        let mut series = MeasurementSeries::default();
        let mut stats = RunningStats::default();
        for value in values {
            series.record(value);
            stats.record(value);
        }

        assert_eq!(series.values(), &values);
        assert_eq!(series.summarize(), stats.summarize());
    }

    #[test]
    fn test_merge_running_stats() {
        let mut north = RunningStats::default();
        north.record(1.0);
        north.record(4.0);
        let mut south = RunningStats::default();
        south.record(-2.0);

        north.merge(south);
        let summary = north.summarize().unwrap();
        assert_eq!(summary.min, -2.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.mean, 1.0);
        assert_eq!(summary.count, 3);

        // Merging an empty accumulator changes nothing
        north.merge(RunningStats::default());
        assert_eq!(north.summarize().unwrap(), summary);
    }

    #[test]
    fn test_group_by_name_merges_lossy_collisions() {
        let mut stations = HashMap::new();
        let mut first = MeasurementSeries::default();
        first.record(1.0);
        let mut second = MeasurementSeries::default();
        second.record(100.0);
        stations.insert(vec![b'S', 0xC3], first);
        stations.insert(vec![b'S', 0xC5], second);

        let grouped = group_by_name(stations);

        assert_eq!(grouped.len(), 1);
        let summary = grouped["S\u{fffd}"].summarize().unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 100.0);
    }

    #[test]
    fn test_summary_display() {
        let summary = StationSummary {
            min: 10.0,
            mean: 15.0,
            max: 20.0,
            count: 2,
        };

        assert_eq!(summary.to_string(), "10.0/15.0/20.0");
    }
}
