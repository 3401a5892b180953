pub mod raw;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Deserialize};
use crate::error::{ErrorKind, ProgressError};
use crate::perf::PerfTimer;
pub use raw::RawSessionRow;

/// Value of a group-key column (a drill level).
/// Integral values normalize to `Level` so that `3`, `3.0` and `"3"` are the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Level(i64),
    Label(String),
}

impl GroupKey {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Ok(level) = value.parse::<i64>() {
            return GroupKey::Level(level);
        }
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => GroupKey::from_f64(number),
            _ => GroupKey::Label(value.to_string()),
        }
    }

    pub fn from_f64(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            GroupKey::Level(value as i64)
        } else {
            GroupKey::Label(value.to_string())
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Level(level) => write!(f, "{}", level),
            GroupKey::Label(label) => f.write_str(label),
        }
    }
}

/// Which group-key family to read from a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKeyField {
    /// Group-key A ("DLP")
    PowerLevel,
    /// Group-key B ("DLA")
    AccuracyLevel,
}

impl GroupKeyField {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKeyField::PowerLevel => "power-level",
            GroupKeyField::AccuracyLevel => "accuracy-level",
        }
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            GroupKeyField::PowerLevel => "DLP",
            GroupKeyField::AccuracyLevel => "DLA",
        }
    }
}

/// Numeric per-session columns that can be averaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    PowerPct,
    AccuracyPct,
}

impl MetricField {
    pub fn column_name(&self) -> &'static str {
        match self {
            MetricField::PowerPct => "Power %",
            MetricField::AccuracyPct => "Accuracy %",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampField {
    Start,
    End,
}

/// A normalized session: combined timestamps, effective totals and ratio metrics
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub power_level: GroupKey,
    pub accuracy_level: GroupKey,
    /// Kicks after sleep and skip exclusions; always positive
    pub total_kicks: u32,
    pub power_kicks: u32,
    pub accurate_kicks: u32,
    pub goals: u32,
    /// round(power_kicks / total_kicks * 100), in [0, 100]
    pub power_pct: f64,
    /// round(accurate_kicks / total_kicks * 100), in [0, 100]
    pub accuracy_pct: f64,
}

impl SessionRecord {
    /// Normalize one raw row. `index` is the row's position in the input and is
    /// attached to any error.
    pub fn from_raw(raw: &RawSessionRow, index: usize) -> Result<Self, ProgressError> {
        let date = raw::parse_date(&raw.date).ok_or_else(|| {
            parse_error(format!("Invalid date '{}'", raw.date), index)
        })?;
        let start_time = raw::parse_time(&raw.start).ok_or_else(|| {
            parse_error(format!("Invalid start time '{}'", raw.start), index)
        })?;
        let end_time = raw::parse_time(&raw.end).ok_or_else(|| {
            parse_error(format!("Invalid end time '{}'", raw.end), index)
        })?;

        let effective = i64::from(raw.total_kicks)
            - i64::from(raw.sleep_kicks)
            - i64::from(raw.skipped_kicks);
        if effective <= 0 {
            return Err(ProgressError::data_integrity(format!(
                "Effective total kicks is {} (total {} - sleep {} - skips {})",
                effective, raw.total_kicks, raw.sleep_kicks, raw.skipped_kicks
            ))
            .with_record(index)
            .with_context(format!("date: {}", raw.date)));
        }
        // effective <= total_kicks, so it fits in u32
        let total_kicks = effective as u32;

        for (name, count) in [("power", raw.power_kicks), ("accurate", raw.accurate_kicks)] {
            if count > total_kicks {
                return Err(ProgressError::data_integrity(format!(
                    "{} kicks ({}) exceed effective total kicks ({})",
                    name, count, total_kicks
                ))
                .with_record(index)
                .with_context(format!("date: {}", raw.date)));
            }
        }

        Ok(SessionRecord {
            date,
            start: date.and_time(start_time),
            end: date.and_time(end_time),
            power_level: raw.power_level.clone(),
            accuracy_level: raw.accuracy_level.clone(),
            total_kicks,
            power_kicks: raw.power_kicks,
            accurate_kicks: raw.accurate_kicks,
            goals: raw.goals,
            power_pct: ratio_pct(raw.power_kicks, total_kicks),
            accuracy_pct: ratio_pct(raw.accurate_kicks, total_kicks),
        })
    }

    pub fn group_key(&self, field: GroupKeyField) -> &GroupKey {
        match field {
            GroupKeyField::PowerLevel => &self.power_level,
            GroupKeyField::AccuracyLevel => &self.accuracy_level,
        }
    }

    pub fn metric(&self, field: MetricField) -> f64 {
        match field {
            MetricField::PowerPct => self.power_pct,
            MetricField::AccuracyPct => self.accuracy_pct,
        }
    }

    pub fn timestamp(&self, field: TimestampField) -> NaiveDateTime {
        match field {
            TimestampField::Start => self.start,
            TimestampField::End => self.end,
        }
    }
}

/// Percentage rounded half-to-even, the way the spreadsheet tooling rounds
pub fn ratio_pct(count: u32, total: u32) -> f64 {
    (f64::from(count) / f64::from(total) * 100.0).round_ties_even()
}

fn parse_error(message: String, index: usize) -> ProgressError {
    ProgressError::new(ErrorKind::Parse, message, "load").with_record(index)
}

/// Fail with `LimitExceeded` once `count` rows are more than `max_records`
pub fn check_limit(count: usize, max_records: usize) -> Result<(), ProgressError> {
    if count > max_records {
        return Err(ProgressError::new(
            ErrorKind::LimitExceeded,
            format!("Record set exceeds the limit of {} rows", max_records),
            "load"
        ));
    }
    Ok(())
}

/// Normalize raw rows, failing on the first malformed one
pub fn normalize_rows(rows: &[RawSessionRow]) -> Result<Vec<SessionRecord>, ProgressError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| SessionRecord::from_raw(row, index))
        .collect()
}

/// Read session records from CSV with a header row
pub fn read_csv<R: Read>(reader: R, max_records: usize) -> Result<Vec<SessionRecord>, ProgressError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawSessionRow>() {
        rows.push(result?);
        check_limit(rows.len(), max_records)?;
    }
    normalize_rows(&rows)
}

/// Read session records from a JSON array of objects
pub fn read_json<R: Read>(reader: R, max_records: usize) -> Result<Vec<SessionRecord>, ProgressError> {
    let rows: Vec<RawSessionRow> = serde_json::from_reader(reader)?;
    check_limit(rows.len(), max_records)?;
    normalize_rows(&rows)
}

/// Load and normalize all session records from a file.
/// The format is chosen by extension (`.csv` or `.json`).
pub fn load_sessions(path: &Path, max_records: usize) -> Result<Vec<SessionRecord>, ProgressError> {
    let _timer = PerfTimer::new("load");

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    let file = File::open(path).map_err(|e| ProgressError::new(
        ErrorKind::Io,
        format!("Failed to open session file: {}", e),
        "io"
    ).with_context(format!("path: {:?}", path)))?;
    let reader = BufReader::new(file);

    let records = match extension.as_deref() {
        Some("csv") => read_csv(reader, max_records),
        Some("json") => read_json(reader, max_records),
        _ => {
            return Err(ProgressError::new(
                ErrorKind::Parse,
                "Unsupported session file format (expected .csv or .json)",
                "load"
            ).with_context(format!("path: {:?}", path)));
        }
    }
    .map_err(|e| e.with_context(format!("path: {:?}", path)))?;

    tracing::info!(
        path = ?path,
        records = records.len(),
        "Loaded session records"
    );
    Ok(records)
}
