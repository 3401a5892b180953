pub mod aggregate;
pub mod calendar;
pub mod chart;
pub mod moving_average;
pub mod query;

use serde::{Serialize, Deserialize};
use crate::error::ProgressError;
use crate::perf::PerfTimer;
use crate::sessions::{check_limit, normalize_rows, GroupKeyField, MetricField, RawSessionRow, SessionRecord, TimestampField};
use self::aggregate::aggregate;
use self::calendar::PeriodStarts;
use self::chart::{build_chart, ChartPayload, Warning};
use self::moving_average::{compute_moving_average, WindowStrategy};
use self::query::{ChartQuery, MetricFamily, WindowMonths};

/// A session with both moving averages attached
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WindowedRecord {
    pub session: SessionRecord,
    pub avg_power: f64,
    pub avg_accuracy: f64,
}

impl WindowedRecord {
    pub fn moving_average(&self, family: MetricFamily) -> f64 {
        match family {
            MetricFamily::Power => self.avg_power,
            MetricFamily::Accuracy => self.avg_accuracy,
        }
    }
}

/// A windowed session with every period start precomputed
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BucketedRecord {
    pub windowed: WindowedRecord,
    pub periods: PeriodStarts,
}

/// Which key each metric family's moving average is partitioned by, and how.
///
/// The dashboard this replaces grouped both families by power level; that is
/// the default here. Set `accuracy_group` to `AccuracyLevel` to partition the
/// accuracy average by its own level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPlan {
    pub power_group: GroupKeyField,
    pub accuracy_group: GroupKeyField,
    pub timestamp: TimestampField,
    pub strategy: WindowStrategy,
}

impl Default for WindowPlan {
    fn default() -> Self {
        WindowPlan {
            power_group: GroupKeyField::PowerLevel,
            accuracy_group: GroupKeyField::PowerLevel,
            timestamp: TimestampField::Start,
            strategy: WindowStrategy::Sliding,
        }
    }
}

impl WindowPlan {
    pub fn group_for(&self, family: MetricFamily) -> GroupKeyField {
        match family {
            MetricFamily::Power => self.power_group,
            MetricFamily::Accuracy => self.accuracy_group,
        }
    }
}

/// Attach both moving averages to every record
pub fn window_records(
    records: Vec<SessionRecord>,
    window: WindowMonths,
    plan: &WindowPlan,
) -> Vec<WindowedRecord> {
    let _timer = PerfTimer::new("window");

    let avg_power = compute_moving_average(
        &records,
        plan.power_group,
        MetricField::PowerPct,
        plan.timestamp,
        window,
        plan.strategy,
    );
    let avg_accuracy = compute_moving_average(
        &records,
        plan.accuracy_group,
        MetricField::AccuracyPct,
        plan.timestamp,
        window,
        plan.strategy,
    );

    records
        .into_iter()
        .zip(avg_power.into_iter().zip(avg_accuracy))
        .map(|(session, (avg_power, avg_accuracy))| WindowedRecord {
            session,
            avg_power,
            avg_accuracy,
        })
        .collect()
}

pub fn bucket_records(records: Vec<WindowedRecord>) -> Vec<BucketedRecord> {
    records
        .into_iter()
        .map(|windowed| BucketedRecord {
            periods: PeriodStarts::for_date(windowed.session.date),
            windowed,
        })
        .collect()
}

/// Run the full pipeline for one chart request over already-normalized records
pub fn compute_chart(records: Vec<SessionRecord>, query: ChartQuery, plan: &WindowPlan) -> ChartPayload {
    let _timer = PerfTimer::new("compute_chart");
    let mut warnings = Vec::new();

    let display_factor = query.metric.display_factor();
    let grouped_by = plan.group_for(query.metric);
    if grouped_by != display_factor {
        tracing::warn!(
            metric = query.metric.as_str(),
            display_factor = display_factor.as_str(),
            grouped_by = grouped_by.as_str(),
            "Moving average is partitioned by a different key than the chart is colored by"
        );
        warnings.push(Warning::GroupingMismatch {
            metric: query.metric,
            display_factor,
            grouped_by,
        });
    }

    if records.is_empty() {
        tracing::warn!("Empty record set, returning an empty chart");
        warnings.push(Warning::EmptyInput);
    }

    let input = records.len();
    let windowed = window_records(records, query.window, plan);
    let bucketed = bucket_records(windowed);
    let rows = aggregate(&bucketed, query.period, display_factor);

    tracing::info!(
        metric = query.metric.as_str(),
        period = query.period.label(),
        window_months = query.window.get(),
        records = input,
        rows = rows.len(),
        "Computed chart"
    );

    build_chart(rows, query, warnings)
}

/// Entry point for the UI layer: validate the three raw parameters, then
/// apply the row limit, then normalize the rows and compute. Parameter errors
/// are reported before any record is touched.
pub fn query_chart(
    rows: &[RawSessionRow],
    metric: &str,
    period: &str,
    window_months: u32,
    plan: &WindowPlan,
    max_records: usize,
) -> Result<ChartPayload, ProgressError> {
    let query = ChartQuery::parse(metric, period, window_months)?;
    check_limit(rows.len(), max_records)?;
    let records = normalize_rows(rows)?;
    Ok(compute_chart(records, query, plan))
}
