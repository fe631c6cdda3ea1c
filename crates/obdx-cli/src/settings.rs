//! Optional settings file, loadable from TOML.

use std::path::Path;

use obdx_canbus::LoopbackInterfaces;
use serde::Deserialize;

/// Top-level settings. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Interfaces used when neither --ecu nor --query is given.
    #[serde(default)]
    pub loopback: LoopbackInterfaces,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Settings {
    /// Load settings from a TOML file path.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents)?;
        Ok(settings)
    }
}
