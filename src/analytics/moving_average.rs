//! Trailing calendar-month moving average, computed per group key

use std::collections::HashMap;
use chrono::NaiveDateTime;
use serde::{Serialize, Deserialize};
use crate::sessions::{GroupKey, GroupKeyField, MetricField, SessionRecord, TimestampField};
use super::calendar::subtract_months;
use super::query::WindowMonths;

/// How the window members are found within a partition.
/// Both strategies sum the same slice in the same order, so their results are
/// bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowStrategy {
    /// Rescan the whole partition for every record, O(n²)
    BruteForce,
    /// Two pointers over the timestamp-sorted partition
    #[default]
    Sliding,
}

impl WindowStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowStrategy::BruteForce => "brute-force",
            WindowStrategy::Sliding => "sliding",
        }
    }
}

impl std::str::FromStr for WindowStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brute-force" | "brute_force" => Ok(WindowStrategy::BruteForce),
            "sliding" => Ok(WindowStrategy::Sliding),
            other => Err(format!("unknown window strategy '{}'", other)),
        }
    }
}

/// Mean of `metric` over all records with the same `group_key` whose
/// `timestamp` lies in `[T - window months, T]`, for every record's own T.
///
/// The returned column is aligned with `records`: element `i` belongs to
/// `records[i]`, whatever order the input is in. Records sharing a timestamp
/// are all inside each other's window.
pub fn compute_moving_average(
    records: &[SessionRecord],
    group_key: GroupKeyField,
    metric: MetricField,
    timestamp: TimestampField,
    window: WindowMonths,
    strategy: WindowStrategy,
) -> Vec<f64> {
    let mut partitions: HashMap<&GroupKey, Vec<usize>> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        partitions.entry(record.group_key(group_key)).or_default().push(index);
    }

    let mut averages = vec![0.0; records.len()];
    for members in partitions.values() {
        let mut sorted = members.clone();
        // stable: equal timestamps keep input order
        sorted.sort_by_key(|&i| records[i].timestamp(timestamp));

        let points: Vec<(NaiveDateTime, f64)> = sorted
            .iter()
            .map(|&i| (records[i].timestamp(timestamp), records[i].metric(metric)))
            .collect();

        let means = match strategy {
            WindowStrategy::BruteForce => brute_force_means(&points, window),
            WindowStrategy::Sliding => sliding_means(&points, window),
        };

        for (&index, mean) in sorted.iter().zip(means) {
            averages[index] = mean;
        }
    }

    tracing::debug!(
        group_key = group_key.as_str(),
        metric = metric.column_name(),
        partitions = partitions.len(),
        window_months = window.get(),
        strategy = strategy.as_str(),
        "Computed moving average"
    );
    averages
}

fn window_floor(at: NaiveDateTime, window: WindowMonths) -> NaiveDateTime {
    subtract_months(at, window.get()).unwrap_or(NaiveDateTime::MIN)
}

fn mean(values: &[(NaiveDateTime, f64)]) -> f64 {
    values.iter().map(|(_, value)| value).sum::<f64>() / values.len() as f64
}

/// Reference definition: for each point, filter the whole partition.
/// `points` must be sorted by timestamp.
fn brute_force_means(points: &[(NaiveDateTime, f64)], window: WindowMonths) -> Vec<f64> {
    points
        .iter()
        .map(|&(at, _)| {
            let floor = window_floor(at, window);
            let members: Vec<(NaiveDateTime, f64)> = points
                .iter()
                .filter(|(ts, _)| *ts >= floor && *ts <= at)
                .copied()
                .collect();
            mean(&members)
        })
        .collect()
}

/// `points` must be sorted by timestamp. The upper edge only moves forward.
/// The floor does not: month-end clamping keeps the time of day, so
/// May-30 12:00 and May-31 08:00 both land on Feb-28 with the later one
/// reaching further back. The lower bound is searched per point.
fn sliding_means(points: &[(NaiveDateTime, f64)], window: WindowMonths) -> Vec<f64> {
    let mut means = Vec::with_capacity(points.len());
    let mut hi = 0;
    for &(at, _) in points {
        while hi < points.len() && points[hi].0 <= at {
            hi += 1;
        }
        let floor = window_floor(at, window);
        let lo = points[..hi].partition_point(|(ts, _)| *ts < floor);
        means.push(mean(&points[lo..hi]));
    }
    means
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(10, 0, 0).unwrap()
    }

    fn window(months: u32) -> WindowMonths {
        WindowMonths::new(months).unwrap()
    }

    #[test]
    fn test_sliding_matches_brute_force_on_ties() {
        let points = vec![
            (at(2024, 1, 1), 10.0),
            (at(2024, 1, 1), 30.0),
            (at(2024, 2, 1), 50.0),
            (at(2024, 2, 1), 70.0),
            (at(2024, 3, 2), 90.0),
        ];
        let brute = brute_force_means(&points, window(1));
        let sliding = sliding_means(&points, window(1));
        assert_eq!(brute, sliding);
        // Both Jan-1 records are inside each other's window
        assert_eq!(sliding[0], 20.0);
        assert_eq!(sliding[1], 20.0);
        // Feb-1 reaches back to Jan-1 inclusive
        assert_eq!(sliding[2], 40.0);
        // Mar-2 reaches back to Feb-2 only
        assert_eq!(sliding[4], 90.0);
    }

    #[test]
    fn test_month_end_clamped_window() {
        // Mar-31 - 1 month = Feb-29 (leap year), so Feb-28 falls outside
        let points = vec![
            (at(2024, 2, 28), 0.0),
            (at(2024, 2, 29), 50.0),
            (at(2024, 3, 31), 100.0),
        ];
        let means = sliding_means(&points, window(1));
        assert_eq!(means[2], 75.0);
        assert_eq!(brute_force_means(&points, window(1)), means);
    }

    #[test]
    fn test_clamped_floor_can_move_backwards() {
        let at = |m, d, h| NaiveDate::from_ymd_opt(2023, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap();
        // May-30 12:00 reaches back to Feb-28 12:00, May-31 08:00 to Feb-28 08:00
        let points = vec![
            (at(2, 28, 8), 0.0),
            (at(5, 30, 12), 50.0),
            (at(5, 31, 8), 100.0),
        ];
        let sliding = sliding_means(&points, window(3));
        assert_eq!(sliding, vec![0.0, 50.0, 50.0]);
        assert_eq!(brute_force_means(&points, window(3)), sliding);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("sliding".parse::<WindowStrategy>(), Ok(WindowStrategy::Sliding));
        assert_eq!("brute-force".parse::<WindowStrategy>(), Ok(WindowStrategy::BruteForce));
        assert!("fast".parse::<WindowStrategy>().is_err());
    }
}
