use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::error::ProgressError;
use crate::sessions::{GroupKeyField, MetricField};
use super::calendar::{Period, PERIOD_LABELS};

pub const MIN_WINDOW_MONTHS: u32 = 1;
pub const MAX_WINDOW_MONTHS: u32 = 12;

/// Rejected query parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    #[error("unknown metric family '{0}' (expected rate_1/power or rate_2/accuracy)")]
    UnknownMetric(String),
    #[error("unknown period granularity '{0}' (expected week, month, quarter or year)")]
    UnknownPeriod(String),
    #[error("window of {0} months is outside 1..=12")]
    WindowOutOfRange(u32),
    #[error("invalid window length '{0}'")]
    InvalidWindow(String),
    #[error("unknown group key '{0}' (expected power-level or accuracy-level)")]
    UnknownGroupKey(String),
}

impl From<ParameterError> for ProgressError {
    fn from(err: ParameterError) -> Self {
        ProgressError::invalid_parameter(err.to_string()).with_source("query")
    }
}

/// Which analysis the chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    /// Power analysis (rate_1)
    #[default]
    Power,
    /// Accuracy analysis (rate_2)
    Accuracy,
}

impl MetricFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Power => "power",
            MetricFamily::Accuracy => "accuracy",
        }
    }

    /// Group key the aggregate rows and chart series are keyed by
    pub fn display_factor(&self) -> GroupKeyField {
        match self {
            MetricFamily::Power => GroupKeyField::PowerLevel,
            MetricFamily::Accuracy => GroupKeyField::AccuracyLevel,
        }
    }

    pub fn metric_field(&self) -> MetricField {
        match self {
            MetricFamily::Power => MetricField::PowerPct,
            MetricFamily::Accuracy => MetricField::AccuracyPct,
        }
    }

    /// Column name of the moving average for this family
    pub fn average_column(&self) -> &'static str {
        match self {
            MetricFamily::Power => "Average_Power",
            MetricFamily::Accuracy => "Average_Accuracy",
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricFamily {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rate_1" | "power" | "power analysis" => Ok(MetricFamily::Power),
            "rate_2" | "accuracy" | "accuracy analysis" => Ok(MetricFamily::Accuracy),
            _ => Err(ParameterError::UnknownMetric(s.to_string())),
        }
    }
}

impl FromStr for Period {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PERIOD_LABELS
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(wanted))
            .map(|(_, period)| *period)
            .ok_or_else(|| ParameterError::UnknownPeriod(s.to_string()))
    }
}

impl FromStr for GroupKeyField {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power-level" | "power_level" | "dlp" => Ok(GroupKeyField::PowerLevel),
            "accuracy-level" | "accuracy_level" | "dla" => Ok(GroupKeyField::AccuracyLevel),
            _ => Err(ParameterError::UnknownGroupKey(s.to_string())),
        }
    }
}

/// Trailing window length in calendar months, always within 1..=12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WindowMonths(u32);

impl WindowMonths {
    pub fn new(months: u32) -> Result<Self, ParameterError> {
        if (MIN_WINDOW_MONTHS..=MAX_WINDOW_MONTHS).contains(&months) {
            Ok(WindowMonths(months))
        } else {
            Err(ParameterError::WindowOutOfRange(months))
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for WindowMonths {
    fn default() -> Self {
        WindowMonths(3)
    }
}

impl TryFrom<u32> for WindowMonths {
    type Error = ParameterError;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        WindowMonths::new(months)
    }
}

impl From<WindowMonths> for u32 {
    fn from(window: WindowMonths) -> Self {
        window.0
    }
}

impl FromStr for WindowMonths {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let months = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ParameterError::InvalidWindow(s.to_string()))?;
        WindowMonths::new(months)
    }
}

/// The three parameters the dashboard sends with every chart request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartQuery {
    pub metric: MetricFamily,
    pub period: Period,
    pub window: WindowMonths,
}

impl ChartQuery {
    pub fn new(metric: MetricFamily, period: Period, window: WindowMonths) -> Self {
        ChartQuery { metric, period, window }
    }

    /// Validate raw parameters as received from the UI layer.
    /// Nothing is computed unless all three are valid.
    pub fn parse(metric: &str, period: &str, window_months: u32) -> Result<Self, ProgressError> {
        Ok(ChartQuery {
            metric: metric.parse()?,
            period: period.parse()?,
            window: WindowMonths::new(window_months)?,
        })
    }
}
