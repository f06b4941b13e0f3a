//! Leveled, fielded logger.
//!
//! A [`Logger`] owns the sink, the formatter and the minimum level. An
//! [`Entry`] is a cheap handle onto a logger plus a set of contextual fields.
//! Adding fields never touches the receiver; it returns a new entry whose
//! field set layers the new keys on top of the old ones.
//!
//! ```text
//! Logger ──into_entry()──▶ Entry {}               (Arc<Logger>, Arc<Fields>)
//!                           │ with_field("svc", "api")
//!                           ▼
//!                          Entry { svc }
//!                           │ log(Warn, ["msg", "slow"])
//!                           ▼
//!                          Record { svc, msg } ──Formatter──▶ sink
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tracing::warn;

use crate::error::Error;
use crate::formatter::{Formatter, Record};
use crate::level::Level;
use crate::value::{Fields, Value};

/// Sink, formatter and level threshold shared by every entry derived from it.
pub struct Logger {
    out: Mutex<Box<dyn Write + Send>>,
    formatter: Box<dyn Formatter>,
    level: Level,
}

impl Logger {
    /// Creates a logger writing to `sink`. The minimum level defaults to `Info`.
    pub fn new(sink: impl Write + Send + 'static, formatter: impl Formatter + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(sink)),
            formatter: Box::new(formatter),
            level: Level::default(),
        }
    }

    /// Sets the minimum level. Entries below it are discarded.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// A field-less entry on this logger.
    pub fn into_entry(self) -> Entry {
        Entry { logger: Arc::new(self), fields: Arc::new(Fields::new()) }
    }

    fn write(&self, level: Level, fields: &Fields) -> Result<(), Error> {
        let record = Record { level, time: OffsetDateTime::now_utc(), fields };
        let mut buf = Vec::with_capacity(256);
        self.formatter.format(&record, &mut buf)?;

        // A panic mid-write leaves the sink usable; keep logging.
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&buf)?;
        out.flush()?;
        Ok(())
    }
}

/// A logger handle carrying contextual fields.
#[derive(Clone)]
pub struct Entry {
    logger: Arc<Logger>,
    fields: Arc<Fields>,
}

impl Entry {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// True when both entries share the same field set, not merely equal ones.
    pub fn same_fields(&self, other: &Entry) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }

    /// Returns a new entry with `key` set to `value`.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Entry {
        let mut fields = Fields::clone(&self.fields);
        fields.insert(key.into(), value.into());
        self.derive(fields)
    }

    /// Returns a new entry with every field of `extra` layered over the current ones.
    pub fn with_fields(&self, extra: impl IntoIterator<Item = (String, Value)>) -> Entry {
        let mut fields = Fields::clone(&self.fields);
        fields.extend(extra);
        self.derive(fields)
    }

    /// Emits one record at `level`.
    ///
    /// `keyvals` is a flat, even-length key/value list. Pairs whose key is not
    /// a string are skipped. A trailing key without a value is ignored; callers
    /// that want it logged pad the list first.
    ///
    /// Failures after this point (formatting, writing) are reported through
    /// `tracing` and otherwise swallowed.
    pub fn log(&self, level: Level, keyvals: &[Value]) {
        if !self.logger.enabled(level) {
            return;
        }

        let mut fields = Fields::clone(&self.fields);
        fields.extend(string_keyed(keyvals));

        if let Err(e) = self.logger.write(level, &fields) {
            warn!(error = %e, %level, "failed to write log entry");
        }
    }

    fn derive(&self, fields: Fields) -> Entry {
        Entry { logger: Arc::clone(&self.logger), fields: Arc::new(fields) }
    }
}

/// Pairs up a flat key/value list, keeping only pairs with a string key.
pub(crate) fn string_keyed(keyvals: &[Value]) -> impl Iterator<Item = (String, Value)> + '_ {
    keyvals
        .chunks_exact(2)
        .filter_map(|pair| Some((pair[0].as_str()?.to_owned(), pair[1].clone())))
}
