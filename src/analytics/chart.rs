use std::collections::HashMap;
use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use crate::sessions::GroupKeyField;
use super::aggregate::AggregateRow;
use super::query::{ChartQuery, MetricFamily};

pub const MOVING_AVERAGE_PANEL: &str = "Cumulative average";
pub const RAW_RATIO_PANEL: &str = "Average";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub period_start: NaiveDate,
    pub value: f64,
}

/// One line on a panel; the group key is the color dimension
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Series {
    pub group_key: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_field: String,
    pub series: Vec<Series>,
}

/// Non-fatal conditions reported alongside the result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The record set was empty; the chart has no points
    EmptyInput,
    /// The moving average was partitioned by a different key than the one
    /// the chart is colored by
    GroupingMismatch {
        metric: MetricFamily,
        display_factor: GroupKeyField,
        grouped_by: GroupKeyField,
    },
}

/// Everything the chart renderer needs: the aggregate table plus two stacked
/// panels sharing the period axis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartPayload {
    pub query: ChartQuery,
    pub x_field: String,
    pub color_field: String,
    pub rows: Vec<AggregateRow>,
    pub panels: Vec<Panel>,
    pub warnings: Vec<Warning>,
}

impl ChartPayload {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn panel(&self, title: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.title == title)
    }
}

fn build_panel<F>(title: &str, y_field: &str, rows: &[AggregateRow], value: F) -> Panel
where
    F: Fn(&AggregateRow) -> f64,
{
    let mut series: Vec<Series> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.group_key.as_str()).or_insert_with(|| {
            series.push(Series {
                group_key: row.group_key.clone(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        series[slot].points.push(ChartPoint {
            period_start: row.period_start,
            value: value(row),
        });
    }

    Panel {
        title: title.to_string(),
        y_field: y_field.to_string(),
        series,
    }
}

/// Split aggregate rows (already in period order) into the moving-average
/// panel and the raw-ratio panel for the query's metric family.
pub fn build_chart(rows: Vec<AggregateRow>, query: ChartQuery, warnings: Vec<Warning>) -> ChartPayload {
    let family = query.metric;
    let panels = vec![
        build_panel(MOVING_AVERAGE_PANEL, family.average_column(), &rows, |r| r.moving_average(family)),
        build_panel(RAW_RATIO_PANEL, family.metric_field().column_name(), &rows, |r| r.raw_ratio(family)),
    ];

    ChartPayload {
        query,
        x_field: query.period.column_name().to_string(),
        color_field: family.display_factor().column_name().to_string(),
        rows,
        panels,
        warnings,
    }
}
