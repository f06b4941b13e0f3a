//! Key/value translation through the public adapter API.

use std::collections::HashMap;
use std::thread;

use kvlog::{Adapter, Error, Level, LogFormat, LoggerConfig, MISSING, Serde, Value, kv};
use serde_json::json;

mod common;

use common::{Capture, json_adapter};

#[test]
fn even_pairs_become_fields_at_info() {
    let (logger, out) = json_adapter();
    logger.log(kv!["user", "ada", "attempt", 2]).unwrap();

    assert_eq!(
        out.records(),
        vec![json!({"severity": "INFO", "context": {"data": {"user": "ada", "attempt": 2}}})],
    );
}

#[test]
fn odd_log_gets_missing_value() {
    let (logger, out) = json_adapter();
    logger.log(kv!["user", "ada", "orphan"]).unwrap();

    let data = &out.records()[0]["context"]["data"];
    assert_eq!(data["orphan"], MISSING);
    assert_eq!(data.as_object().unwrap().len(), 2);
}

#[test]
fn odd_with_values_gets_missing_value() {
    let (logger, _) = json_adapter();
    let ctx = logger.with_values(kv!["orphan"]).unwrap();
    assert_eq!(ctx.entry().fields().get("orphan"), Some(&Value::Missing));
}

#[test]
fn severity_pair_selects_level_and_is_removed() {
    let (logger, out) = json_adapter();
    logger.log(kv!["msg", "disk low", "severity", Level::Warn, "free_mb", 12]).unwrap();

    assert_eq!(
        out.records()[0],
        json!({"severity": "WARNING", "message": "disk low", "context": {"data": {"free_mb": 12}}}),
    );
}

#[test]
fn unrecognized_severity_stays_a_field() {
    let (logger, out) = json_adapter();
    logger.log(kv!["severity", "high", "SEVERITY", Level::Error]).unwrap();

    let record = &out.records()[0];
    assert_eq!(record["severity"], "INFO");
    assert_eq!(record["context"]["data"]["severity"], "high");
    assert_eq!(record["context"]["data"]["SEVERITY"], "error");
}

#[test]
fn log_at_ignores_severity_pairs() {
    let (logger, out) = json_adapter();
    logger.log_at(Level::Debug, kv!["severity", Level::Error]).unwrap();
    assert!(out.text().is_empty(), "debug is below the default threshold");

    logger.log_at(Level::Error, kv!["severity", Level::Debug]).unwrap();
    let record = &out.records()[0];
    assert_eq!(record["severity"], "ERROR");
    assert_eq!(record["context"]["data"]["severity"], "debug");
}

#[test]
fn non_string_keys_do_not_shift_pairs() {
    let (logger, out) = json_adapter();
    logger.log(kv![1, "lost", "kept", true, 2.5, "lost too", "last", "x"]).unwrap();

    assert_eq!(out.records()[0]["context"]["data"], json!({"kept": true, "last": "x"}));
}

#[test]
fn empty_with_values_shares_context() {
    let (logger, _) = json_adapter();
    let logger = logger.with_values(kv!["a", 1]).unwrap();
    let same = logger.with_values(kv![]).unwrap();
    assert!(same.entry().same_fields(logger.entry()));
}

#[test]
fn with_values_layers_without_mutating() {
    let (root, out) = json_adapter();
    let a = root.with_values(kv!["svc", "api", "region", "eu"]).unwrap();
    let b = a.with_values(kv!["region", "us"]).unwrap();

    root.log(kv!["n", 0]).unwrap();
    a.log(kv!["n", 1]).unwrap();
    b.log(kv!["n", 2]).unwrap();

    let data: Vec<_> = out.records().into_iter().map(|r| r["context"]["data"].clone()).collect();
    assert_eq!(data[0], json!({"n": 0}));
    assert_eq!(data[1], json!({"n": 1, "svc": "api", "region": "eu"}));
    assert_eq!(data[2], json!({"n": 2, "svc": "api", "region": "us"}));
}

#[test]
fn with_fields_takes_pairs() {
    let (root, out) = json_adapter();
    let logger = root.with_fields([("tenant", Value::from("acme")), ("shard", Value::from(4u8))]);
    logger.log(kv!["msg", "hi"]).unwrap();

    assert_eq!(out.records()[0]["context"]["data"], json!({"tenant": "acme", "shard": 4}));
}

#[test]
fn copy_failure_emits_nothing() {
    let (logger, out) = json_adapter();
    let bad: HashMap<Vec<u8>, u8> = HashMap::from([(vec![1], 1)]);

    let err = logger.log(kv!["msg", "x", "payload", Serde(bad.clone())]).unwrap_err();
    assert!(matches!(err, Error::Copy(_)));
    assert!(out.text().is_empty());

    assert!(matches!(logger.with_values(kv!["payload", Serde(bad)]), Err(Error::Copy(_))));
}

#[test]
fn serde_values_nest() {
    #[derive(serde::Serialize)]
    struct Order {
        id: u32,
        lines: Vec<&'static str>,
    }

    let (logger, out) = json_adapter();
    logger.log(kv!["order", Serde(Order { id: 9, lines: vec!["tea"] })]).unwrap();
    assert_eq!(out.records()[0]["context"]["data"]["order"], json!({"id": 9, "lines": ["tea"]}));
}

#[test]
fn text_config_with_threshold() {
    let capture = Capture::default();
    let config = LoggerConfig {
        level: Level::Warn,
        format: LogFormat::Text,
        service: Some("billing".into()),
        timestamps: false,
        ..LoggerConfig::default()
    };
    let logger = Adapter::from_config(&config, capture.clone());

    logger.log(kv!["msg", "quiet"]).unwrap();
    logger.log(kv!["msg", "card declined", "severity", Level::Warn, "code", 51]).unwrap();

    assert_eq!(capture.text(), "level=warn msg=\"card declined\" service=billing code=51\n");
}

#[test]
fn shared_across_threads() {
    let (logger, out) = json_adapter();
    thread::scope(|s| {
        for worker in 0..4 {
            let logger = logger.with_values(kv!["worker", worker]).unwrap();
            s.spawn(move || {
                for n in 0..25 {
                    logger.log(kv!["n", n]).unwrap();
                }
            });
        }
    });
    assert_eq!(out.records().len(), 100);
}
