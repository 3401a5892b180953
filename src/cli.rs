use std::path::PathBuf;
use clap::{Parser, ValueEnum};
use crate::analytics::moving_average::WindowStrategy;
use crate::sessions::GroupKeyField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// Aggregate rows as CSV
    Csv,
    /// Full chart payload (rows, panels, warnings) as JSON
    Json,
}

/// Compute moving-average performance charts from player session records
#[derive(Debug, Parser)]
#[command(name = "player-progress", version, about)]
pub struct Cli {
    /// Session records (.csv or .json)
    #[arg(short, long, env = "PLAYER_PROGRESS_DATA")]
    pub data: Option<PathBuf>,

    /// Analysis type: power (rate_1) or accuracy (rate_2)
    #[arg(short, long)]
    pub analysis: Option<String>,

    /// Aggregation period: week, month, quarter or year
    #[arg(short, long)]
    pub period: Option<String>,

    /// Moving-average window in months (1-12)
    #[arg(short, long)]
    pub window: Option<u32>,

    /// Partition key for the accuracy moving average
    #[arg(long)]
    pub accuracy_group: Option<GroupKeyField>,

    /// Window search strategy
    #[arg(long)]
    pub strategy: Option<WindowStrategy>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Settings file (TOML); overrides PLAYER_PROGRESS_CONFIG
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "player-progress",
            "--data", "sessions.csv",
            "--analysis", "accuracy",
            "--period", "quarter",
            "--window", "6",
            "--accuracy-group", "accuracy-level",
            "--strategy", "brute-force",
            "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.data, Some(PathBuf::from("sessions.csv")));
        assert_eq!(cli.analysis.as_deref(), Some("accuracy"));
        assert_eq!(cli.window, Some(6));
        assert_eq!(cli.accuracy_group, Some(GroupKeyField::AccuracyLevel));
        assert_eq!(cli.strategy, Some(WindowStrategy::BruteForce));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_group_key_rejected() {
        let result = Cli::try_parse_from(["player-progress", "--accuracy-group", "speed"]);
        assert!(result.is_err());
    }
}
