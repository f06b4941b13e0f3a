//! # kvlog
//!
//! Key/value logging for services that ship structured logs.
//! One call convention in, leveled entries with fields out.
//!
//! ## The contract
//!
//! Call sites log flat, alternating key/value lists. The backend wants a
//! level and a set of named fields. kvlog sits in between and owns exactly
//! that translation:
//!
//! - **Odd-length lists** — completed with a `"(MISSING)"` value, never dropped
//! - **Non-string keys** — skipped; they cannot name a field
//! - **`"severity"` pairs** — a `("severity", Level)` pair picks the level and
//!   is removed from the fields; without one, entries log at `Info`
//! - **Context** — `with_values` / `with_fields` return a new logger carrying
//!   extra fields; the original is never touched
//!
//! What kvlog does not do: sampling, rotation, async shipping. Write to
//! stdout and let the platform's log agent collect it.
//!
//! The [`middleware`] module holds the policy consulted by request-logging
//! middleware: which RPCs and HTTP requests to log (health checks and gRPC
//! reflection are skipped by default) and whether an error was already
//! reported.
//!
//! ## Quick start
//!
//! ```rust
//! use kvlog::{Adapter, FormatOption, Level, kv};
//!
//! let logger = Adapter::new(std::io::stdout(), [
//!     FormatOption::Service("checkout".into()),
//!     FormatOption::Version("2.3.0".into()),
//! ]);
//!
//! // Per-request context: a new adapter, `logger` itself is unchanged.
//! let req_logger = logger.with_values(kv!["request_id", "c0ffee"])?;
//!
//! req_logger.log(kv!["msg", "cart loaded", "items", 3])?;
//! req_logger.log(kv!["msg", "payment slow", "latency_ms", 1840, "severity", Level::Warn])?;
//!
//! // Or name the level outright.
//! req_logger.log_at(Level::Error, kv!["msg", "payment failed"])?;
//! # Ok::<(), kvlog::Error>(())
//! ```

mod adapter;
mod config;
mod entry;
mod error;
mod formatter;
mod level;
mod value;

#[cfg(test)]
mod testing;

pub mod middleware;

pub use adapter::{Adapter, SEVERITY_KEY};
pub use config::{LogFormat, LoggerConfig};
pub use entry::{Entry, Logger};
pub use error::Error;
pub use formatter::{FormatOption, Formatter, JsonFormatter, Record, TextFormatter};
pub use level::Level;
pub use value::{Fields, MISSING, Serde, ToValue, Value};
