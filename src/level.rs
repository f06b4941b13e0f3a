//! Log severity as a typed, ordered enum.
//!
//! Ordering follows severity: `Trace < Debug < Info < … < Panic`. A logger
//! writes an entry when its level is at or above the logger's minimum.
//!
//! `Fatal` and `Panic` are ordinary severities here. Logging at them never
//! exits the process or unwinds; they only select how the entry is labelled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A log severity.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
    Panic,
}

impl Level {
    /// Returns the lowercase name (e.g. `"warn"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info  => "info",
            Self::Warn  => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }

    /// Returns the Google Cloud Logging `LogSeverity` name for this level.
    pub fn stackdriver(self) -> &'static str {
        match self {
            Self::Trace | Self::Debug => "DEBUG",
            Self::Info                => "INFO",
            Self::Warn                => "WARNING",
            Self::Error               => "ERROR",
            Self::Fatal               => "CRITICAL",
            Self::Panic               => "ALERT",
        }
    }
}

/// Parses a level name. Case-insensitive; `"warning"` is accepted for `Warn`.
impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace"             => Ok(Self::Trace),
            "debug"             => Ok(Self::Debug),
            "info"              => Ok(Self::Info),
            "warn" | "warning"  => Ok(Self::Warn),
            "error"             => Ok(Self::Error),
            "fatal"             => Ok(Self::Fatal),
            "panic"             => Ok(Self::Panic),
            _                   => Err(Error::UnknownLevel(s.to_owned())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Self::Trace,
            tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO  => Self::Info,
            tracing::Level::WARN  => Self::Warn,
            tracing::Level::ERROR => Self::Error,
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
