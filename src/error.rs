//! Unified error type.

/// The error type returned by kvlog's fallible operations.
///
/// Only [`Error::Copy`] reaches callers of [`Adapter::log`](crate::Adapter::log)
/// and [`Adapter::with_values`](crate::Adapter::with_values). Write and
/// formatting failures happen after a record is accepted; the logger reports
/// them through `tracing` instead of returning them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key/value argument could not be converted into a [`Value`](crate::Value).
    #[error("copy key/value argument: {0}")]
    Copy(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("format timestamp: {0}")]
    Format(#[from] time::error::Format),

    #[error("encode record: {0}")]
    Json(#[source] serde_json::Error),

    #[error("unknown log level `{0}`")]
    UnknownLevel(String),

    #[error("unknown log format `{0}`")]
    UnknownFormat(String),

    #[error("expected a boolean flag, got `{0}`")]
    UnknownFlag(String),
}

impl Error {
    /// Wraps a conversion failure raised while copying a key/value argument.
    pub fn copy(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Copy(err.into())
    }
}
