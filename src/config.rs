//! Settings
//! Portal address, download behavior and chart presentation options.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `result-charts.toml` in the working directory)
//! 3. `RESULT_CHARTS_BASE_URL` environment variable
//! 4. Command line flags, applied by the binary

use crate::charts::{ChartOptions, ExamTooltip, PassFailLegend};
use crate::download::DownloadStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "result-charts.toml";
pub const BASE_URL_ENV: &str = "RESULT_CHARTS_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Reports are saved here; unset means ask with a save dialog.
    pub download_dir: Option<PathBuf>,
    pub download_strategy: DownloadStrategy,
    pub exam_tooltip: ExamTooltip,
    pub pass_fail_legend: PassFailLegend,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            download_dir: None,
            download_strategy: DownloadStrategy::default(),
            exam_tooltip: ExamTooltip::default(),
            pass_fail_legend: PassFailLegend::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, or from the default file if it exists, then apply
    /// the environment. Call [`validate`](Self::validate) once flags are applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };
        settings.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Replace the base URL when `value` is set and not blank.
    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            debug!(%url, "base url overridden");
            self.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            exam_tooltip: self.exam_tooltip,
            pass_fail_legend: self.pass_fail_legend,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
