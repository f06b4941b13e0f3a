//! Record formatters.
//!
//! A [`Formatter`] turns one [`Record`] into bytes. The logger hands it a
//! reusable buffer and writes the result to the sink in one call, so a
//! formatter must emit a complete line, trailing newline included.
//!
//! | Formatter | Layout |
//! |---|---|
//! | [`JsonFormatter`] | Google Cloud Logging structured JSON, one object per line |
//! | [`TextFormatter`] | logfmt, `key=value` pairs separated by spaces |
//!
//! Both promote a string field named `msg` (or `message`) to the record's
//! message. JSON writes every other field as-is; text renames the ones that
//! would clash with its header keys.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::Error;
use crate::level::Level;
use crate::value::{Fields, Value};

const MESSAGE_KEYS: [&str; 2] = ["msg", "message"];

/// One log event, as seen by a formatter.
pub struct Record<'a> {
    pub level: Level,
    pub time: OffsetDateTime,
    pub fields: &'a Fields,
}

impl<'a> Record<'a> {
    /// The promoted message and its key, if a `msg`/`message` string field exists.
    fn message(&self) -> Option<(&'a str, &'a str)> {
        let fields = self.fields;
        MESSAGE_KEYS.iter().find_map(|key| {
            let (k, v) = fields.get_key_value(*key)?;
            Some((k.as_str(), v.as_str()?))
        })
    }
}

/// Serializes records. Shared by every entry of a logger, across threads.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<(), Error>;
}

/// Formatter settings, passed through unmodified when an adapter is created.
#[derive(Clone, Debug, PartialEq)]
pub enum FormatOption {
    /// Service name reported in `serviceContext`.
    Service(String),
    /// Service version reported in `serviceContext`.
    Version(String),
    /// Omit the timestamp. Mostly useful for reproducible output.
    DisableTimestamp,
}

#[derive(Clone, Debug, Default)]
struct Settings {
    service: Option<String>,
    version: Option<String>,
    no_timestamp: bool,
}

impl Settings {
    fn from_options(opts: impl IntoIterator<Item = FormatOption>) -> Self {
        let mut settings = Self::default();
        for opt in opts {
            match opt {
                FormatOption::Service(s)       => settings.service = Some(s),
                FormatOption::Version(v)       => settings.version = Some(v),
                FormatOption::DisableTimestamp => settings.no_timestamp = true,
            }
        }
        settings
    }

    fn timestamp(&self, record: &Record<'_>) -> Result<Option<String>, Error> {
        if self.no_timestamp {
            return Ok(None);
        }
        Ok(Some(record.time.format(&Rfc3339)?))
    }
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Google Cloud Logging ("Stackdriver") structured JSON.
///
/// ```text
/// {"severity":"WARNING","eventTime":"2024-05-01T10:00:00Z","message":"slow",
///  "serviceContext":{"service":"api","version":"1.2"},
///  "context":{"data":{"latency_ms":812}}}
/// ```
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    settings: Settings,
}

impl JsonFormatter {
    pub fn new(opts: impl IntoIterator<Item = FormatOption>) -> Self {
        Self { settings: Settings::from_options(opts) }
    }
}

#[derive(Serialize)]
struct StackdriverRecord<'a> {
    severity: &'static str,
    #[serde(rename = "eventTime", skip_serializing_if = "Option::is_none")]
    event_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(rename = "serviceContext", skip_serializing_if = "Option::is_none")]
    service_context: Option<ServiceContext<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Context<'a>>,
}

#[derive(Serialize)]
struct ServiceContext<'a> {
    service: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

#[derive(Serialize)]
struct Context<'a> {
    data: BTreeMap<&'a str, &'a Value>,
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<(), Error> {
        let message = record.message();
        let data: BTreeMap<&str, &Value> = record.fields.iter()
            .filter(|(k, _)| Some(k.as_str()) != message.map(|(key, _)| key))
            .map(|(k, v)| (k.as_str(), v))
            .collect();

        let out = StackdriverRecord {
            severity: record.level.stackdriver(),
            event_time: self.settings.timestamp(record)?,
            message: message.map(|(_, m)| m),
            service_context: self.settings.service.as_deref().map(|service| ServiceContext {
                service,
                version: self.settings.version.as_deref(),
            }),
            context: (!data.is_empty()).then_some(Context { data }),
        };

        serde_json::to_writer(&mut *buf, &out).map_err(Error::Json)?;
        buf.push(b'\n');
        Ok(())
    }
}

// ── Text ──────────────────────────────────────────────────────────────────────

/// logfmt output for local development.
///
/// ```text
/// time=2024-05-01T10:00:00Z level=warn msg=slow latency_ms=812
/// ```
///
/// A field named like one of the header keys (`time`, `level`, `msg`,
/// `service`, `version`) is written as `fields.<key>`. Spaces, `=`, quotes
/// and control characters in keys become `_`.
#[derive(Clone, Debug, Default)]
pub struct TextFormatter {
    settings: Settings,
}

impl TextFormatter {
    pub fn new(opts: impl IntoIterator<Item = FormatOption>) -> Self {
        Self { settings: Settings::from_options(opts) }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<(), Error> {
        if let Some(ts) = self.settings.timestamp(record)? {
            write!(buf, "time={ts} ")?;
        }
        write!(buf, "level={}", record.level)?;

        let message = record.message();
        if let Some((_, msg)) = message {
            write_pair(buf, "msg", msg)?;
        }
        if let Some(service) = &self.settings.service {
            write_pair(buf, "service", service)?;
        }
        if let Some(version) = &self.settings.version {
            write_pair(buf, "version", version)?;
        }
        for (key, value) in record.fields {
            if Some(key.as_str()) == message.map(|(k, _)| k) {
                continue;
            }
            let mut key = sanitize_key(key);
            if HEADER_KEYS.contains(&key.as_str()) {
                key.insert_str(0, "fields.");
            }
            write_pair(buf, &key, &value.to_string())?;
        }
        buf.push(b'\n');
        Ok(())
    }
}

const HEADER_KEYS: [&str; 5] = ["time", "level", "msg", "service", "version"];

fn needs_escape(c: char) -> bool {
    c == ' ' || c == '=' || c == '"' || c.is_control()
}

fn sanitize_key(key: &str) -> String {
    if key.is_empty() {
        return "_".to_owned();
    }
    key.chars().map(|c| if needs_escape(c) { '_' } else { c }).collect()
}

fn write_pair(buf: &mut Vec<u8>, key: &str, value: &str) -> Result<(), Error> {
    let needs_quotes = value.is_empty() || value.chars().any(needs_escape);
    if needs_quotes {
        write!(buf, " {key}={value:?}")?;
    } else {
        write!(buf, " {key}={value}")?;
    }
    Ok(())
}
