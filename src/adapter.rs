//! Key/value logging on top of leveled entries.
//!
//! Call sites speak the flat key/value convention:
//!
//! ```rust
//! use kvlog::{Adapter, FormatOption, Level, kv};
//!
//! let logger = Adapter::new(std::io::stdout(), [FormatOption::Service("billing".into())]);
//! let logger = logger.with_values(kv!["request_id", "r-17"])?;
//!
//! logger.log(kv!["msg", "charge accepted", "amount", 1250])?;
//! logger.log(kv!["msg", "card declined", "severity", Level::Warn])?;
//! # Ok::<(), kvlog::Error>(())
//! ```
//!
//! The adapter copies every argument into an owned [`Value`], completes an
//! odd-length list with [`Value::Missing`], lifts out a `"severity"` pair if
//! one carries a [`Level`], and forwards the rest to the underlying
//! [`Entry`] as fields.

use std::io::Write;

use tracing::debug;

use crate::config::{LogFormat, LoggerConfig};
use crate::entry::{Entry, Logger, string_keyed};
use crate::error::Error;
use crate::formatter::{FormatOption, JsonFormatter, TextFormatter};
use crate::level::Level;
use crate::value::{ToValue, Value};

/// Reserved key whose [`Level`] value selects the severity of a [`Adapter::log`] call.
pub const SEVERITY_KEY: &str = "severity";

/// Builds the `&[&dyn ToValue]` argument list of the adapter's logging calls.
///
/// ```rust
/// # use kvlog::{ToValue, kv};
/// let args: &[&dyn ToValue] = kv!["user", "ada", "attempt", 3, "ok", false];
/// assert_eq!(args.len(), 6);
/// ```
#[macro_export]
macro_rules! kv {
    ($($arg:expr),* $(,)?) => {
        &[$(&$arg as &dyn $crate::ToValue),*]
    };
}

/// A key/value logger wrapping a leveled, fielded [`Entry`].
///
/// Cloning is cheap and every `with_*` call returns a new adapter, so one
/// adapter can be shared across threads and each request can derive its own
/// contextual copy without coordination.
#[derive(Clone)]
pub struct Adapter {
    entry: Entry,
}

impl Adapter {
    /// Creates an adapter writing Stackdriver-style JSON to `sink`.
    ///
    /// `opts` is handed to [`JsonFormatter::new`] unmodified.
    pub fn new(
        sink: impl Write + Send + 'static,
        opts: impl IntoIterator<Item = FormatOption>,
    ) -> Self {
        Self::from_entry(Logger::new(sink, JsonFormatter::new(opts)).into_entry())
    }

    /// Creates an adapter as described by `config`.
    pub fn from_config(config: &LoggerConfig, sink: impl Write + Send + 'static) -> Self {
        let opts = config.format_options();
        let logger = match config.format {
            LogFormat::Json => Logger::new(sink, JsonFormatter::new(opts)),
            LogFormat::Text => Logger::new(sink, TextFormatter::new(opts)),
        };
        Self::from_entry(logger.with_level(config.level).into_entry())
    }

    pub fn from_entry(entry: Entry) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns an adapter whose context carries `keyvals` on top of the current fields.
    ///
    /// With no arguments the result shares this adapter's field set. Pairs
    /// with a non-string key are skipped. The receiver is never modified.
    ///
    /// # Errors
    ///
    /// [`Error::Copy`] if an argument cannot be converted.
    pub fn with_values(&self, keyvals: &[&dyn ToValue]) -> Result<Adapter, Error> {
        if keyvals.is_empty() {
            return Ok(self.clone());
        }
        let kvs = copy_keyvals(keyvals)?;
        Ok(Self { entry: self.entry.with_fields(string_keyed(&kvs)) })
    }

    /// Returns an adapter with `fields` layered over the current context.
    pub fn with_fields<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>) -> Adapter
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v.into()));
        Self { entry: self.entry.with_fields(fields) }
    }

    /// Logs one entry built from `keyvals`.
    ///
    /// The first pair `("severity", <Level>)` is removed and selects the
    /// level; without one the entry is logged at [`Level::Info`]. A
    /// `"severity"` key with any other kind of value stays an ordinary field.
    ///
    /// # Errors
    ///
    /// [`Error::Copy`] if an argument cannot be converted. Nothing is logged
    /// in that case.
    pub fn log(&self, keyvals: &[&dyn ToValue]) -> Result<(), Error> {
        let mut kvs = copy_keyvals(keyvals)?;
        let level = take_severity(&mut kvs).unwrap_or(Level::Info);
        self.entry.log(level, &kvs);
        Ok(())
    }

    /// Logs one entry at `level`. No `"severity"` lookup takes place.
    ///
    /// # Errors
    ///
    /// [`Error::Copy`] if an argument cannot be converted.
    pub fn log_at(&self, level: Level, keyvals: &[&dyn ToValue]) -> Result<(), Error> {
        let kvs = copy_keyvals(keyvals)?;
        self.entry.log(level, &kvs);
        Ok(())
    }
}

/// Copies caller arguments into owned values, completing odd-length lists.
fn copy_keyvals(keyvals: &[&dyn ToValue]) -> Result<Vec<Value>, Error> {
    let mut kvs = Vec::with_capacity(keyvals.len() + 1);
    for arg in keyvals {
        kvs.push(arg.to_value()?);
    }
    if kvs.len() % 2 != 0 {
        debug!(len = kvs.len(), "odd key/value count, appending missing value");
        kvs.push(Value::Missing);
    }
    Ok(kvs)
}

/// Removes the first `("severity", <Level>)` pair and returns its level.
///
/// Only key positions are inspected, so a `"severity"` string sitting in a
/// value slot never selects the level. `kvs` must be even-length.
fn take_severity(kvs: &mut Vec<Value>) -> Option<Level> {
    let at = kvs.chunks_exact(2).position(|pair| {
        pair[0].as_str() == Some(SEVERITY_KEY) && pair[1].as_level().is_some()
    })? * 2;
    let level = kvs[at + 1].as_level();
    kvs.drain(at..at + 2);
    level
}
