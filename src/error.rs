use serde::{Serialize, Deserialize};
use std::fmt;

/// Category of a [`ProgressError`].
/// Callers match on this instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A record cannot produce a defined ratio (zero/negative denominator, counters out of range)
    DataIntegrity,
    /// Unknown metric family or period, or window length out of range
    InvalidParameter,
    /// A cell in the input could not be parsed
    Parse,
    /// The record set is larger than the configured guard
    LimitExceeded,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DataIntegrity => "data_integrity",
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::Parse => "parse",
            ErrorKind::LimitExceeded => "limit_exceeded",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

/// Unified error type for the whole crate.
/// All library functions return Result<T, ProgressError>.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressError {
    pub kind: ErrorKind,
    pub message: String,
    pub stage: String,
    /// Zero-based index of the offending input record, when one is known
    pub record: Option<usize>,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl ProgressError {
    /// Create a new error with kind, message and stage
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S, stage: &'static str) -> Self {
        ProgressError {
            kind,
            message: message.into(),
            stage: stage.to_string(),
            record: None,
            context: None,
            source: None,
        }
    }

    pub fn data_integrity<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::DataIntegrity, message, "load")
    }

    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::new(ErrorKind::InvalidParameter, message, "query")
    }

    /// Attach the index of the record that triggered the error
    pub fn with_record(mut self, index: usize) -> Self {
        self.record = Some(index);
        self
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_data_integrity(&self) -> bool {
        self.kind == ErrorKind::DataIntegrity
    }

    pub fn is_invalid_parameter(&self) -> bool {
        self.kind == ErrorKind::InvalidParameter
    }
}

impl fmt::Display for ProgressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.stage, self.kind.as_str(), self.message)?;
        if let Some(record) = self.record {
            write!(f, " (record: {})", record)?;
        }
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProgressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for ProgressError {
    fn from(err: std::io::Error) -> Self {
        ProgressError::new(
            ErrorKind::Io,
            format!("I/O error: {}", err),
            "io"
        ).with_source("std::io")
    }
}

impl From<serde_json::Error> for ProgressError {
    fn from(err: serde_json::Error) -> Self {
        ProgressError::new(
            ErrorKind::Parse,
            format!("JSON error: {}", err),
            "json_parse"
        ).with_source("serde_json")
    }
}

impl From<csv::Error> for ProgressError {
    fn from(err: csv::Error) -> Self {
        let kind = if err.is_io_error() { ErrorKind::Io } else { ErrorKind::Parse };
        let mut error = ProgressError::new(
            kind,
            format!("CSV error: {}", err),
            "csv_parse"
        ).with_source("csv");
        // the header row occupies csv record 0
        if let Some(pos) = err.position() {
            if pos.record() > 0 {
                error = error.with_record(pos.record() as usize - 1);
            }
        }
        error
    }
}

impl From<toml::de::Error> for ProgressError {
    fn from(err: toml::de::Error) -> Self {
        ProgressError::new(
            ErrorKind::Config,
            format!("TOML error: {}", err),
            "config"
        ).with_source("toml")
    }
}
