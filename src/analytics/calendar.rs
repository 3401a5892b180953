//! Calendar period boundaries and month arithmetic

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{Serialize, Deserialize};

/// Time-bucket granularity of the chart's horizontal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

/// Label shown in the aggregation dropdown → period.
/// Passed to the aggregator explicitly; there is no global lookup.
pub const PERIOD_LABELS: [(&str, Period); 4] = [
    ("Week", Period::Week),
    ("Month", Period::Month),
    ("Quarter", Period::Quarter),
    ("Year", Period::Year),
];

impl Period {
    pub fn label(&self) -> &'static str {
        PERIOD_LABELS
            .iter()
            .find(|(_, period)| period == self)
            .map(|(label, _)| *label)
            .unwrap_or("Month")
    }

    /// Name of the period-start column in the bucketed table
    pub fn column_name(&self) -> &'static str {
        match self {
            Period::Week => "First week day",
            Period::Month => "Month",
            Period::Quarter => "Quarter",
            Period::Year => "Year",
        }
    }

    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Week => week_start(date),
            Period::Month => month_start(date),
            Period::Quarter => quarter_start(date),
            Period::Year => year_start(date),
        }
    }
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the quarter: Jan 1, Apr 1, Jul 1 or Oct 1
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = (date.month0() / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// `timestamp` moved back by `months` calendar months. The day is clamped to
/// the last day of the target month (Mar 31 - 1 month = Feb 28/29); the time
/// of day is kept. Returns `None` only below chrono's minimum date.
pub fn subtract_months(timestamp: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    timestamp.checked_sub_months(Months::new(months))
}

/// All four period starts for one date, computed once per record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodStarts {
    pub week: NaiveDate,
    pub month: NaiveDate,
    pub quarter: NaiveDate,
    pub year: NaiveDate,
}

impl PeriodStarts {
    pub fn for_date(date: NaiveDate) -> Self {
        PeriodStarts {
            week: week_start(date),
            month: month_start(date),
            quarter: quarter_start(date),
            year: year_start(date),
        }
    }

    pub fn get(&self, period: Period) -> NaiveDate {
        match period {
            Period::Week => self.week,
            Period::Month => self.month,
            Period::Quarter => self.quarter,
            Period::Year => self.year,
        }
    }
}
