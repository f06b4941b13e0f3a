//! Minimal kvlog example — key/value logging and a logged HTTP service.
//!
//! Run with:
//!   RUST_LOG=debug LOG_FORMAT=text cargo run --example basic
//!
//! `RUST_LOG` controls kvlog's own diagnostics (via tracing-subscriber);
//! the `LOG_*` variables configure the adapter itself.

use std::time::Duration;

use http::{Extensions, Request, Response};
use kvlog::middleware::trace::{HttpLogLayer, RpcLogger};
use kvlog::middleware::{build_options, with_http_filter};
use kvlog::{Adapter, Level, LoggerConfig, kv};
use tower::{Layer, ServiceExt, service_fn};

#[tokio::main]
async fn main() -> Result<(), kvlog::Error> {
    tracing_subscriber::fmt::init();

    let config = LoggerConfig::from_env()?;
    let logger = Adapter::from_config(&config, std::io::stdout());

    logger.log(kv!["msg", "starting", "pid", std::process::id()])?;
    logger.log(kv!["msg", "config file missing, using defaults", "severity", Level::Warn])?;

    // Skip metrics scrapes on top of the usual health checks.
    let opts = build_options([with_http_filter(|req| {
        let path = req.uri.path();
        !path.starts_with("/health") && path != "/metrics"
    })]);

    let svc = HttpLogLayer::new(logger.with_values(kv!["component", "http"])?, opts.clone())
        .layer(service_fn(get_user));

    for path in ["/users/42", "/healthz", "/metrics", "/users/"] {
        let req = Request::builder().uri(path).body(String::new()).expect("valid request");
        let _ = svc.clone().oneshot(req).await;
    }

    let rpc = RpcLogger::new(logger.with_values(kv!["component", "grpc"])?, opts);
    let ctx = Extensions::new();
    rpc.log_call(&ctx, "/users.v1.Users/Get", None, Duration::from_millis(4))?;
    rpc.log_call(&ctx, "/grpc.health.v1.Health/Check", None, Duration::ZERO)?;

    Ok(())
}

// GET /users/{id}
async fn get_user(req: Request<String>) -> Result<Response<String>, std::io::Error> {
    let id = req.uri().path().trim_start_matches("/users/");
    let res = if id.is_empty() {
        Response::builder().status(400).body(String::new())
    } else {
        Response::builder().body(format!(r#"{{"id":"{id}","name":"alice"}}"#))
    };
    res.map_err(std::io::Error::other)
}
