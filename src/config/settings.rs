use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use lazy_static::lazy_static;
use crate::analytics::calendar::Period;
use crate::analytics::moving_average::WindowStrategy;
use crate::analytics::query::{MetricFamily, WindowMonths};
use crate::analytics::WindowPlan;
use crate::error::{ErrorKind, ProgressError};
use crate::logging::LogFormat;
use crate::sessions::GroupKeyField;

pub const CONFIG_ENV_VAR: &str = "PLAYER_PROGRESS_CONFIG";
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Session file used when none is given on the command line
    pub data_path: Option<PathBuf>,
    pub default_metric: MetricFamily,
    pub default_period: Period,
    pub default_window_months: WindowMonths,
    /// Upper bound on loaded rows; windowing is quadratic in the worst case
    pub max_records: usize,
    /// Partition key for the accuracy moving average
    pub accuracy_group: GroupKeyField,
    pub strategy: WindowStrategy,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            data_path: None,
            default_metric: MetricFamily::Power,
            default_period: Period::Month,
            default_window_months: WindowMonths::default(),
            max_records: DEFAULT_MAX_RECORDS,
            accuracy_group: GroupKeyField::PowerLevel,
            strategy: WindowStrategy::Sliding,
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    pub fn window_plan(&self) -> WindowPlan {
        WindowPlan {
            accuracy_group: self.accuracy_group,
            strategy: self.strategy,
            ..WindowPlan::default()
        }
    }
}

/// Where the active settings came from. Logged once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsOrigin {
    File(PathBuf),
    Defaults,
    /// The file exists but could not be used
    Fallback { path: PathBuf, error: String },
}

#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub origin: SettingsOrigin,
}

/// Platform-specific app data directory
pub fn app_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support/player-progress");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push("player-progress");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share/player-progress");
            return dir;
        }
    }

    // Fallback
    PathBuf::from(".")
}

fn default_config_path() -> PathBuf {
    app_data_dir().join("settings.toml")
}

/// A settings file the user asked for by name: `--config`, else the
/// environment variable. `None` means the app-data default applies.
pub fn explicit_config_path(cli: Option<&Path>, env: Option<OsString>) -> Option<PathBuf> {
    cli.map(Path::to_path_buf)
        .or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from))
}

pub fn parse_settings(content: &str) -> Result<Settings, ProgressError> {
    Ok(toml::from_str::<Settings>(content)?)
}

/// Load settings from an explicitly requested file. A missing or malformed
/// file is an error.
pub fn load_settings_from(path: &Path) -> Result<Settings, ProgressError> {
    let content = fs::read_to_string(path).map_err(|e| ProgressError::new(
        ErrorKind::Config,
        format!("Failed to read settings file: {}", e),
        "config"
    ).with_context(format!("path: {:?}", path)))?;

    parse_settings(&content).map_err(|e| e.with_context(format!("path: {:?}", path)))
}

fn load_settings_internal() -> LoadedSettings {
    let path = default_config_path();

    match fs::read_to_string(&path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => LoadedSettings {
                settings,
                origin: SettingsOrigin::File(path),
            },
            Err(e) => LoadedSettings {
                settings: Settings::default(),
                origin: SettingsOrigin::Fallback {
                    path,
                    error: e.to_string(),
                },
            },
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => LoadedSettings {
            settings: Settings::default(),
            origin: SettingsOrigin::Defaults,
        },
        Err(e) => LoadedSettings {
            settings: Settings::default(),
            origin: SettingsOrigin::Fallback {
                path,
                error: e.to_string(),
            },
        },
    }
}

lazy_static! {
    static ref SETTINGS: LoadedSettings = load_settings_internal();
}

/// Get the cached default settings (loaded once, from the default location)
pub fn get_settings() -> &'static LoadedSettings {
    &SETTINGS
}

/// Settings for one run. An explicitly named file must load cleanly; only
/// the app-data default falls back to built-in settings.
pub fn resolve_settings(cli_config: Option<&Path>) -> Result<LoadedSettings, ProgressError> {
    match explicit_config_path(cli_config, std::env::var_os(CONFIG_ENV_VAR)) {
        Some(path) => Ok(LoadedSettings {
            settings: load_settings_from(&path)?,
            origin: SettingsOrigin::File(path),
        }),
        None => Ok(get_settings().clone()),
    }
}

/// Log where the active settings came from
pub fn log_origin(origin: &SettingsOrigin) {
    match origin {
        SettingsOrigin::File(path) => {
            tracing::info!(path = ?path, "Loaded settings");
        }
        SettingsOrigin::Defaults => {
            tracing::debug!("No settings file, using defaults");
        }
        SettingsOrigin::Fallback { path, error } => {
            tracing::warn!(path = ?path, error = %error, "Failed to load settings, using defaults");
        }
    }
}
