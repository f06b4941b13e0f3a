//! Middleware layer.
//!
//! Request-logging middleware asks three questions on every call: should this
//! RPC be logged, should this HTTP request be logged, and has this error
//! already been reported somewhere else? [`MiddlewareOptions`] holds the
//! answers as functions. Build it once at setup with [`build_options`]:
//!
//! ```rust
//! use kvlog::middleware::{build_options, with_http_filter};
//!
//! let opts = build_options([
//!     with_http_filter(|req| !req.uri.path().starts_with("/metrics")),
//! ]);
//!
//! // RPC filtering and error handling keep their defaults.
//! let ctx = http::Extensions::new();
//! assert!(!opts.should_log_rpc(&ctx, "/grpc.health.v1.Health/Check", None));
//! ```
//!
//! The default filters silence the noise every service has: gRPC health
//! checks and server reflection, and HTTP paths under `/health`.
//!
//! Built-in middleware:
//! - [`trace::HttpLogLayer`] — tower layer, one entry per HTTP request
//! - [`trace::RpcLogger`] — call logger for RPC interceptors

pub mod trace;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::Extensions;
use http::request::Parts;
use tracing::debug;

/// An error as seen by filters and error handlers.
pub type DynError<'a> = &'a (dyn StdError + 'static);

/// Decides whether an RPC is logged: `(context, full method, error) -> log?`.
pub type FilterRpc = Arc<dyn Fn(&Extensions, &str, Option<DynError<'_>>) -> bool + Send + Sync>;

/// Decides whether an HTTP request is logged, from its head.
pub type FilterHttp = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

/// Returns `true` when the error has already been logged: `(context, error, method) -> handled?`.
pub type ErrorHandler = Arc<dyn Fn(&Extensions, DynError<'_>, &str) -> bool + Send + Sync>;

/// Resolved filtering and error-handling policy of one middleware instance.
///
/// Read-only once built. Cloning shares the underlying functions.
#[derive(Clone)]
pub struct MiddlewareOptions {
    filter_rpc: FilterRpc,
    filter_http: FilterHttp,
    error_handler: ErrorHandler,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            filter_rpc: Arc::new(default_filter_rpc),
            filter_http: Arc::new(default_filter_http),
            error_handler: Arc::new(default_error_handler),
        }
    }
}

impl fmt::Debug for MiddlewareOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareOptions").finish_non_exhaustive()
    }
}

impl MiddlewareOptions {
    pub fn should_log_rpc(&self, ctx: &Extensions, full_method: &str, err: Option<DynError<'_>>) -> bool {
        (self.filter_rpc)(ctx, full_method, err)
    }

    pub fn should_log_http(&self, req: &Parts) -> bool {
        (self.filter_http)(req)
    }

    /// True when the error handler reports `err` as already handled.
    pub fn error_handled(&self, ctx: &Extensions, err: DynError<'_>, method: &str) -> bool {
        (self.error_handler)(ctx, err, method)
    }

    pub fn filter_rpc(&self) -> &FilterRpc {
        &self.filter_rpc
    }

    pub fn filter_http(&self) -> &FilterHttp {
        &self.filter_http
    }

    pub fn error_handler(&self) -> &ErrorHandler {
        &self.error_handler
    }
}

/// One override applied by [`build_options`].
pub struct MiddlewareOption(Box<dyn FnOnce(&mut MiddlewareOptions) + Send>);

impl MiddlewareOption {
    /// An arbitrary mutator. Whatever it leaves behind is accepted as-is.
    pub fn new(f: impl FnOnce(&mut MiddlewareOptions) + Send + 'static) -> Self {
        Self(Box::new(f))
    }
}

/// Overrides the RPC filter.
pub fn with_rpc_filter<F>(f: F) -> MiddlewareOption
where
    F: Fn(&Extensions, &str, Option<DynError<'_>>) -> bool + Send + Sync + 'static,
{
    MiddlewareOption::new(move |o| o.filter_rpc = Arc::new(f))
}

/// Overrides the HTTP filter.
pub fn with_http_filter<F>(f: F) -> MiddlewareOption
where
    F: Fn(&Parts) -> bool + Send + Sync + 'static,
{
    MiddlewareOption::new(move |o| o.filter_http = Arc::new(f))
}

/// Overrides the error handler.
pub fn with_error_handler<F>(f: F) -> MiddlewareOption
where
    F: Fn(&Extensions, DynError<'_>, &str) -> bool + Send + Sync + 'static,
{
    MiddlewareOption::new(move |o| o.error_handler = Arc::new(f))
}

/// Resolves `opts` in order over a fresh default configuration.
///
/// Later options win when two target the same setting.
pub fn build_options(opts: impl IntoIterator<Item = MiddlewareOption>) -> MiddlewareOptions {
    let mut resolved = MiddlewareOptions::default();
    let mut applied = 0usize;
    for MiddlewareOption(apply) in opts {
        apply(&mut resolved);
        applied += 1;
    }
    debug!(overrides = applied, "resolved middleware options");
    resolved
}

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Skips gRPC health checks and server reflection.
pub fn default_filter_rpc(_ctx: &Extensions, full_method: &str, _err: Option<DynError<'_>>) -> bool {
    !(full_method.starts_with("/grpc.health") || full_method.starts_with("/grpc.reflection"))
}

/// Skips everything under `/health`.
pub fn default_filter_http(req: &Parts) -> bool {
    !req.uri.path().starts_with("/health")
}

/// Never claims an error; the middleware's own error logging always runs.
pub fn default_error_handler(_ctx: &Extensions, _err: DynError<'_>, _method: &str) -> bool {
    false
}
