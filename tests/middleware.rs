//! Middleware options driving the built-in request loggers.

use std::fmt;
use std::time::Duration;

use http::{Extensions, Request, Response, StatusCode};
use kvlog::middleware::trace::{HttpLogLayer, RpcLogger};
use kvlog::middleware::{build_options, with_error_handler, with_http_filter, with_rpc_filter};
use tower::{Layer, ServiceExt, service_fn};

mod common;

use common::json_adapter;

/// An error the application has already reported before returning it.
#[derive(Debug)]
struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("already reported")
    }
}

impl std::error::Error for Reported {}

fn get(path: &str) -> Request<String> {
    Request::builder().uri(path).body(String::new()).unwrap()
}

#[tokio::test]
async fn custom_http_filter_replaces_default() {
    let (logger, out) = json_adapter();
    let opts = build_options([with_http_filter(|req| req.uri.path() != "/metrics")]);
    let layer = HttpLogLayer::new(logger, opts);

    for path in ["/metrics", "/health/live", "/orders/7"] {
        let svc = layer.layer(service_fn(|_req: Request<String>| async {
            Ok::<_, std::io::Error>(Response::builder().status(404).body(String::new()).unwrap())
        }));
        let res = svc.oneshot(get(path)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    // The default `/health` rule is gone once the filter is overridden.
    let paths: Vec<_> = out
        .records()
        .iter()
        .map(|r| {
            assert_eq!(r["severity"], "WARNING");
            r["context"]["data"]["http.path"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(paths, ["/health/live", "/orders/7"]);
}

#[tokio::test]
async fn error_handler_sees_request_extensions() {
    #[derive(Clone)]
    struct Tenant(&'static str);

    let (logger, out) = json_adapter();
    let opts = build_options([with_error_handler(|ctx, _err, _method| {
        ctx.get::<Tenant>().is_some_and(|t| t.0 == "quiet")
    })]);
    let layer = HttpLogLayer::new(logger, opts);

    for tenant in ["quiet", "loud"] {
        let mut req = get("/pay");
        req.extensions_mut().insert(Tenant(tenant));
        let svc = layer.layer(service_fn(|_req: Request<String>| async {
            Err::<Response<String>, _>(std::io::Error::other("upstream reset"))
        }));
        assert!(svc.oneshot(req).await.is_err());
    }

    let records = out.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["context"]["data"]["error"], "upstream reset");
}

#[test]
fn rpc_error_handler_claims_reported_errors() {
    let (logger, out) = json_adapter();
    let opts = build_options([with_error_handler(|_ctx, err, _method| err.is::<Reported>())]);
    let rpc = RpcLogger::new(logger, opts);
    let ctx = Extensions::new();

    assert!(!rpc.log_call(&ctx, "/shop.Cart/Add", Some(&Reported), Duration::from_millis(1)).unwrap());
    let timeout = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
    assert!(rpc.log_call(&ctx, "/shop.Cart/Add", Some(&timeout), Duration::from_millis(1)).unwrap());
    assert!(rpc.log_call(&ctx, "/shop.Cart/List", None, Duration::from_millis(1)).unwrap());

    let records = out.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["severity"], "ERROR");
    assert_eq!(records[1]["severity"], "INFO");
    assert_eq!(records[1]["message"], "finished call");
}

#[test]
fn rpc_filter_can_look_at_the_error() {
    let (logger, out) = json_adapter();
    let opts = build_options([with_rpc_filter(|_ctx, _method, err| err.is_some())]);
    let rpc = RpcLogger::new(logger, opts);
    let ctx = Extensions::new();

    assert!(!rpc.log_call(&ctx, "/shop.Cart/Add", None, Duration::ZERO).unwrap());
    let err = std::io::Error::other("boom");
    assert!(rpc.log_call(&ctx, "/grpc.health.v1.Health/Check", Some(&err), Duration::ZERO).unwrap());
    assert_eq!(out.records().len(), 1);
}
