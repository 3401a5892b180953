use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use super::GroupKey;

/// One row as it appears in the session export, before normalization.
/// Accepts both snake_case column names and the spreadsheet headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSessionRow {
    #[serde(alias = "Date")]
    pub date: String,
    #[serde(alias = "Start")]
    pub start: String,
    #[serde(alias = "End")]
    pub end: String,
    #[serde(alias = "DLP", deserialize_with = "deserialize_group_key")]
    pub power_level: GroupKey,
    #[serde(alias = "DLA", deserialize_with = "deserialize_group_key")]
    pub accuracy_level: GroupKey,
    #[serde(alias = "TKicks", deserialize_with = "deserialize_count")]
    pub total_kicks: u32,
    #[serde(alias = "TPower", deserialize_with = "deserialize_count")]
    pub power_kicks: u32,
    #[serde(alias = "TAccuracy", deserialize_with = "deserialize_count")]
    pub accurate_kicks: u32,
    #[serde(alias = "TGoals", default, deserialize_with = "deserialize_count")]
    pub goals: u32,
    #[serde(alias = "TSleep", default, deserialize_with = "deserialize_count")]
    pub sleep_kicks: u32,
    #[serde(alias = "TSkips", default, deserialize_with = "deserialize_count")]
    pub skipped_kicks: u32,
}

// Levels show up as integers, floats ("3.0") or text depending on the exporter
fn deserialize_group_key<'de, D>(deserializer: D) -> Result<GroupKey, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct GroupKeyVisitor;

    impl<'de> Visitor<'de> for GroupKeyVisitor {
        type Value = GroupKey;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer level, a number or a text label")
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(GroupKey::Label(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(GroupKey::Level(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(i64::try_from(value)
                .map(GroupKey::Level)
                .unwrap_or_else(|_| GroupKey::Label(value.to_string())))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(GroupKey::from_f64(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.trim().is_empty() {
                return Err(E::custom("empty group key"));
            }
            Ok(GroupKey::parse(value))
        }
    }

    deserializer.deserialize_any(GroupKeyVisitor)
}

// Counts are whole numbers, but some exporters write them as "40.0"
fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Unexpected, Visitor};
    use std::fmt;

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = u32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative whole number")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
                Ok(value as u32)
            } else {
                Err(E::invalid_value(Unexpected::Float(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let trimmed = value.trim();
            if let Ok(count) = trimmed.parse::<u64>() {
                return self.visit_u64(count);
            }
            match trimmed.parse::<f64>() {
                Ok(number) => self.visit_f64(number),
                Err(_) => Err(E::invalid_value(Unexpected::Str(value), &self)),
            }
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M", "%H:%M:%S%.f"];

/// Parse a calendar date. Spreadsheet exports often carry a midnight time
/// component on date columns; it is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a time of day
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}
