//! Per-(period, group key) means of the bucketed session table

use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use crate::sessions::{GroupKey, GroupKeyField};
use super::calendar::Period;
use super::query::MetricFamily;
use super::BucketedRecord;

/// One chart data point: the mean of every numeric column over the sessions
/// that share a period start and a group key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub period_start: NaiveDate,
    /// Display form of the group key ("3", not "3.0")
    pub group_key: String,
    pub sessions: usize,
    pub power_pct: f64,
    pub accuracy_pct: f64,
    pub avg_power: f64,
    pub avg_accuracy: f64,
}

impl AggregateRow {
    /// Value for the moving-average panel
    pub fn moving_average(&self, family: MetricFamily) -> f64 {
        match family {
            MetricFamily::Power => self.avg_power,
            MetricFamily::Accuracy => self.avg_accuracy,
        }
    }

    /// Value for the raw-ratio panel
    pub fn raw_ratio(&self, family: MetricFamily) -> f64 {
        match family {
            MetricFamily::Power => self.power_pct,
            MetricFamily::Accuracy => self.accuracy_pct,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    power_pct: f64,
    accuracy_pct: f64,
    avg_power: f64,
    avg_accuracy: f64,
}

impl Accumulator {
    fn add(&mut self, record: &BucketedRecord) {
        self.count += 1;
        self.power_pct += record.windowed.session.power_pct;
        self.accuracy_pct += record.windowed.session.accuracy_pct;
        self.avg_power += record.windowed.avg_power;
        self.avg_accuracy += record.windowed.avg_accuracy;
    }

    fn finish(self, period_start: NaiveDate, key: &GroupKey) -> AggregateRow {
        let n = self.count as f64;
        AggregateRow {
            period_start,
            group_key: key.to_string(),
            sessions: self.count,
            power_pct: self.power_pct / n,
            accuracy_pct: self.accuracy_pct / n,
            avg_power: self.avg_power / n,
            avg_accuracy: self.avg_accuracy / n,
        }
    }
}

/// Group by (`period` start, `group_key` value) and average each group.
/// Rows come out in ascending period order, then group key order.
/// An empty input gives an empty output.
pub fn aggregate(
    records: &[BucketedRecord],
    period: Period,
    group_key: GroupKeyField,
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(NaiveDate, &GroupKey), Accumulator> = BTreeMap::new();
    for record in records {
        let key = (
            record.periods.get(period),
            record.windowed.session.group_key(group_key),
        );
        groups.entry(key).or_default().add(record);
    }

    let rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|((period_start, key), acc)| acc.finish(period_start, key))
        .collect();

    tracing::debug!(
        period = period.label(),
        group_key = group_key.as_str(),
        input = records.len(),
        rows = rows.len(),
        "Aggregated records"
    );
    rows
}
