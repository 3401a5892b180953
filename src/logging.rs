use serde::{Deserialize, Serialize};
use crate::error::{ErrorKind, ProgressError};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Initialize structured logging with tracing.
/// This should be called once at application startup.
/// Logs go to stderr; stdout carries the query result.
pub fn init_logging(format: LogFormat) -> Result<(), ProgressError> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true)
                        .json()
                );
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                );
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.map_err(|e| ProgressError::new(
        ErrorKind::Config,
        format!("Failed to set global tracing subscriber: {}", e),
        "startup"
    ))?;

    tracing::debug!(format = ?format, "Structured logging initialized");
    Ok(())
}
