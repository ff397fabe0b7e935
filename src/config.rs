// Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::{ConsoleOptions, ConsoleReporter, JunitReporter, MultiReporter, Reporter};

/// Name of the configuration file looked up by [`Config::load`]
pub const CONFIG_FILE_NAME: &str = ".suitereportrc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub junit: JunitConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reporter kinds that can be combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    Console,
    Junit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Reporters to broadcast to, in call order
    #[serde(default = "default_reporters")]
    pub reporters: Vec<ReporterKind>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            reporters: default_reporters(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Enable colored output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            color: default_color(),
        }
    }
}

impl From<&ConsoleConfig> for ConsoleOptions {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            indent_size: config.indent_size,
            color: config.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunitConfig {
    /// Directory receiving one XML file per suite
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Value of the `hostname` attribute
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

impl Default for JunitConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            hostname: default_hostname(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_reporters() -> Vec<ReporterKind> {
    vec![ReporterKind::Console]
}

fn default_indent_size() -> usize {
    crate::report::console::DEFAULT_INDENT_SIZE
}

fn default_color() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_hostname() -> String {
    String::from(crate::report::junit::DEFAULT_HOSTNAME)
}

fn default_log_level() -> String {
    String::from("warn")
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Option<Self> {
        // Check locations in order:
        // 1. ./.suitereportrc.toml
        // 2. ~/.suitereportrc.toml
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_NAME));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_FILE_NAME));
        }

        let path = paths.into_iter().find(|p| p.exists())?;
        match Self::load_from_file(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring configuration file: {}", e);
                None
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Build the configured reporters, broadcasting in configured order.
    /// Console output goes to stdout.
    pub fn build_reporter(&self) -> MultiReporter {
        let reporters = self
            .general
            .reporters
            .iter()
            .map(|kind| -> Box<dyn Reporter> {
                match kind {
                    ReporterKind::Console => {
                        Box::new(ConsoleReporter::new(ConsoleOptions::from(&self.console)))
                    }
                    ReporterKind::Junit => Box::new(
                        JunitReporter::new(self.junit.output_dir.clone())
                            .with_hostname(self.junit.hostname.clone()),
                    ),
                }
            })
            .collect();

        MultiReporter::new(reporters)
    }
}
