pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod sessions;
mod perf;

// Crate-internal test module
#[cfg(test)]
#[path = "../tests/unit/error_handling_test.rs"]
mod error_handling_test;

use std::io::Write;
use crate::analytics::compute_chart;
use crate::analytics::query::ChartQuery;
use crate::cli::{Cli, OutputFormat};
use crate::config::settings::{log_origin, resolve_settings};
use crate::error::ProgressError;

/// Run one chart query as described by the command line
pub fn run(cli: Cli) -> Result<(), ProgressError> {
    let loaded = resolve_settings(cli.config.as_deref())?;

    logging::init_logging(loaded.settings.log_format)?;
    log_origin(&loaded.origin);
    let settings = loaded.settings;

    // Parameters are validated before anything is loaded
    let query = ChartQuery::parse(
        cli.analysis.as_deref().unwrap_or(settings.default_metric.as_str()),
        cli.period.as_deref().unwrap_or(settings.default_period.label()),
        cli.window.unwrap_or(settings.default_window_months.get()),
    )?;

    let mut plan = settings.window_plan();
    if let Some(group) = cli.accuracy_group {
        plan.accuracy_group = group;
    }
    if let Some(strategy) = cli.strategy {
        plan.strategy = strategy;
    }

    let data_path = cli
        .data
        .or_else(|| settings.data_path.clone())
        .ok_or_else(|| ProgressError::invalid_parameter(
            "No session file given (use --data or set data_path in the settings file)"
        ))?;

    let records = sessions::load_sessions(&data_path, settings.max_records)?;
    let payload = compute_chart(records, query, &plan);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Table => output::write_table(&mut out, &payload)?,
        OutputFormat::Csv => output::write_csv(&mut out, &payload.rows)?,
        OutputFormat::Json => output::write_json(&mut out, &payload)?,
    }
    out.flush()?;
    Ok(())
}
