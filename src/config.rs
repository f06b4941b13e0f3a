//! Logger configuration.
//!
//! [`LoggerConfig`] deserializes from any serde format, so it can sit inside
//! a service's own config file, or be read from the environment:
//!
//! | Variable | Field | Example |
//! |---|---|---|
//! | `LOG_LEVEL` | `level` | `debug` |
//! | `LOG_FORMAT` | `format` | `json` / `text` |
//! | `LOG_SERVICE` | `service` | `billing` |
//! | `LOG_VERSION` | `version` | `1.4.2` |
//! | `LOG_TIMESTAMPS` | `timestamps` | `false` |
//!
//! ```rust,no_run
//! use kvlog::{Adapter, LoggerConfig};
//!
//! let config = LoggerConfig::from_env()?;
//! let logger = Adapter::from_config(&config, std::io::stderr());
//! # Ok::<(), kvlog::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::formatter::FormatOption;
use crate::level::Level;

/// Output layout.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "logfmt" => Ok(Self::Text),
            _ => Err(Error::UnknownFormat(s.to_owned())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Text => "text",
        })
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum level written.
    pub level: Level,
    pub format: LogFormat,
    pub service: Option<String>,
    pub version: Option<String>,
    /// Include a timestamp in every record.
    pub timestamps: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: LogFormat::Json,
            service: None,
            version: None,
            timestamps: true,
        }
    }
}

impl LoggerConfig {
    /// Reads the `LOG_*` environment variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unrecognised value.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(level) = lookup("LOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.format = format.parse()?;
        }
        if let Some(service) = lookup("LOG_SERVICE") {
            config.service = Some(service);
        }
        if let Some(version) = lookup("LOG_VERSION") {
            config.version = Some(version);
        }
        if let Some(flag) = lookup("LOG_TIMESTAMPS") {
            config.timestamps = parse_flag(&flag)?;
        }
        Ok(config)
    }

    /// The formatter options this configuration implies.
    pub fn format_options(&self) -> Vec<FormatOption> {
        let mut opts = Vec::new();
        if let Some(service) = &self.service {
            opts.push(FormatOption::Service(service.clone()));
        }
        if let Some(version) = &self.version {
            opts.push(FormatOption::Version(version.clone()));
        }
        if !self.timestamps {
            opts.push(FormatOption::DisableTimestamp);
        }
        opts
    }
}

fn parse_flag(value: &str) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on"  => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _                            => Err(Error::UnknownFlag(value.to_owned())),
    }
}
