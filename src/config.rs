//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `dashboard.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - PollingConfig: How often the coordinator re-fetches the sheet.
//!     - SourceConfig: Where the sheet lives (published csv, sheets api, file).
//!     - ServerConfig: Address the dashboard listens on.
//!     - ExportConfig: Base name of the downloaded csv.
//!     - UiConfig: Presentation toggles.
//!     - LoggingConfig: Default tracing filter.
//!
//! ==============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::export::DEFAULT_BASE_NAME;

/// where the running configuration came from
#[derive(Debug, Clone)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults { rejected: Vec<String> },
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    /// auto-refresh period; the dashboard has always used 5 minutes
    pub interval_seconds: u64,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: 300, timeout_seconds: default_timeout() }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// a sheet published to the web as csv
    SheetCsv { url: String },
    /// google sheets api v4, `values.get` on a range
    SheetsApi {
        #[serde(default = "default_api_base")]
        api_base: String,
        spreadsheet_id: String,
        range: String,
        api_key: String,
    },
    File { path: PathBuf },
}

fn default_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

// never prints the api key
impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SheetCsv { url } => write!(f, "sheet csv {url}"),
            Self::SheetsApi { spreadsheet_id, range, .. } => {
                write!(f, "sheets api {spreadsheet_id} [{range}]")
            }
            Self::File { path } => write!(f, "file {}", path.display()),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::File { path: PathBuf::from("data").join("sensors.csv") }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub base_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { base_name: DEFAULT_BASE_NAME.to_string() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub dark_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from the usual locations, falling back to defaults
    ///
    /// runs before logging is set up, so it reports where the config came from
    /// instead of logging it.
    pub fn load_or_default() -> (Self, ConfigOrigin) {
        let paths = [
            PathBuf::from("config").join("dashboard.toml"),
            PathBuf::from("..").join("config").join("dashboard.toml"),
        ];

        let mut rejected = Vec::new();
        for path in paths {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return (config, ConfigOrigin::File(path)),
                    Err(e) => rejected.push(format!("{:#}", e)),
                }
            }
        }
        (Self::default(), ConfigOrigin::Defaults { rejected })
    }

    /// Log configuration summary
    pub fn log_summary(&self, origin: &ConfigOrigin) {
        match origin {
            ConfigOrigin::File(path) => info!("[CONFIG] Loaded from {}", path.display()),
            ConfigOrigin::Defaults { rejected } => {
                for reason in rejected {
                    warn!("[CONFIG] {}", reason);
                }
                warn!("[CONFIG] No usable config file found - using defaults");
            }
        }
        info!(
            source = %self.source,
            poll_interval_s = self.polling.interval_seconds,
            bind = %self.server.bind,
            export = %self.export.base_name,
            log_level = %self.logging.level,
            "dashboard configuration"
        );
    }
}
