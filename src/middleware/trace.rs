//! Request-logging middleware.
//!
//! # HTTP
//!
//! [`HttpLogLayer`] wraps any tower `Service` over `http::Request` and logs
//! one entry per request once the response is ready:
//!
//! | Outcome | Level | Fields |
//! |---|---|---|
//! | 1xx–3xx | `Info` | `http.method`, `http.path`, `http.status`, `latency_ms` |
//! | 4xx | `Warn` | same |
//! | 5xx | `Error` | same |
//! | inner service error | `Error` | `http.method`, `http.path`, `latency_ms`, `error` |
//!
//! Requests rejected by the HTTP filter pass straight through with no timing
//! and no entry. Service errors the error handler claims are not logged.
//!
//! # RPC
//!
//! RPC frameworks differ too much to wrap generically, so [`RpcLogger`] is a
//! plain call logger: an interceptor times the call and hands the outcome to
//! [`RpcLogger::log_call`].

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use http::{Extensions, Request, Response, StatusCode};
use tower::{Layer, Service};
use tracing::warn;

use crate::adapter::Adapter;
use crate::error::Error;
use crate::level::Level;
use crate::middleware::{DynError, MiddlewareOptions};
use crate::value::Value;

/// A heap-allocated, type-erased response future.
///
/// The logging wrapper is an `async` block whose type cannot be named, so it
/// is boxed to give `Service::Future` a concrete type.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

// ── HTTP ──────────────────────────────────────────────────────────────────────

/// Tower layer adding request logging to an HTTP service.
#[derive(Clone)]
pub struct HttpLogLayer {
    logger: Adapter,
    options: MiddlewareOptions,
}

impl HttpLogLayer {
    pub fn new(logger: Adapter, options: MiddlewareOptions) -> Self {
        Self { logger, options }
    }
}

impl<S> Layer<S> for HttpLogLayer {
    type Service = HttpLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpLog { inner, logger: self.logger.clone(), options: self.options.clone() }
    }
}

/// The service produced by [`HttpLogLayer`].
#[derive(Clone)]
pub struct HttpLog<S> {
    inner: S,
    logger: Adapter,
    options: MiddlewareOptions,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HttpLog<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: StdError + Send + Sync + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let (parts, body) = req.into_parts();
        if !self.options.should_log_http(&parts) {
            return Box::pin(self.inner.call(Request::from_parts(parts, body)));
        }

        let method = parts.method.clone();
        let path = parts.uri.path().to_owned();
        let ctx = parts.extensions.clone();
        let logger = self.logger.clone();
        let options = self.options.clone();

        let start = Instant::now();
        let fut = self.inner.call(Request::from_parts(parts, body));

        Box::pin(async move {
            let result = fut.await;
            let latency_ms = millis(start.elapsed());

            let logged = match &result {
                Ok(res) => logger.log_at(status_level(res.status()), crate::kv![
                    "msg", "request completed",
                    "http.method", method.as_str(),
                    "http.path", path,
                    "http.status", res.status().as_u16(),
                    "latency_ms", latency_ms,
                ]),
                Err(e) if options.error_handled(&ctx, e, &path) => Ok(()),
                Err(e) => logger.log_at(Level::Error, crate::kv![
                    "msg", "request failed",
                    "http.method", method.as_str(),
                    "http.path", path,
                    "latency_ms", latency_ms,
                    "error", Value::error(e),
                ]),
            };
            // Losing a log line must not cost the caller its response.
            if let Err(e) = logged {
                warn!(error = %e, "request log entry dropped");
            }
            result
        })
    }
}

fn status_level(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Error
    } else if status.is_client_error() {
        Level::Warn
    } else {
        Level::Info
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ── RPC ───────────────────────────────────────────────────────────────────────

/// Logs finished RPCs subject to the RPC filter and error handler.
///
/// ```rust
/// use std::time::Duration;
/// use kvlog::Adapter;
/// use kvlog::middleware::{build_options, trace::RpcLogger};
///
/// let rpc = RpcLogger::new(Adapter::new(std::io::sink(), []), build_options([]));
/// let ctx = http::Extensions::new();
///
/// assert!(rpc.log_call(&ctx, "/shop.Cart/Add", None, Duration::from_millis(3))?);
/// assert!(!rpc.log_call(&ctx, "/grpc.health.v1.Health/Check", None, Duration::ZERO)?);
/// # Ok::<(), kvlog::Error>(())
/// ```
#[derive(Clone)]
pub struct RpcLogger {
    logger: Adapter,
    options: MiddlewareOptions,
}

impl RpcLogger {
    pub fn new(logger: Adapter, options: MiddlewareOptions) -> Self {
        Self { logger, options }
    }

    /// Logs one call to `full_method` (`/package.Service/Method`).
    ///
    /// Returns whether an entry was written: `false` when the filter rejected
    /// the call or the error handler claimed its error.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Copy`] from the adapter.
    pub fn log_call(
        &self,
        ctx: &Extensions,
        full_method: &str,
        err: Option<DynError<'_>>,
        elapsed: Duration,
    ) -> Result<bool, Error> {
        if !self.options.should_log_rpc(ctx, full_method, err) {
            return Ok(false);
        }

        let (service, method) = split_method(full_method);
        let time_ms = millis(elapsed);

        match err {
            None => self.logger.log_at(Level::Info, crate::kv![
                "msg", "finished call",
                "grpc.service", service,
                "grpc.method", method,
                "grpc.time_ms", time_ms,
            ])?,
            Some(e) if self.options.error_handled(ctx, e, full_method) => return Ok(false),
            Some(e) => self.logger.log_at(Level::Error, crate::kv![
                "msg", "finished call",
                "grpc.service", service,
                "grpc.method", method,
                "grpc.time_ms", time_ms,
                "error", Value::error(e),
            ])?,
        }
        Ok(true)
    }
}

/// Splits `/pkg.Service/Method` into `("pkg.Service", "Method")`.
fn split_method(full_method: &str) -> (&str, &str) {
    let name = full_method.strip_prefix('/').unwrap_or(full_method);
    name.split_once('/').unwrap_or(("unknown", name))
}
