//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use admission_gate::config::gate::{
    ENV_ADMIT_TIMEOUT_SECS, ENV_DEFER_HISTORY, ENV_HISTORY_PATH, ENV_MAX_CONCURRENT,
};
use admission_gate::config::{GateConfig, HistoryBackendConfig};

#[test]
fn test_default_config_is_valid() {
    let cfg = GateConfig::default();
    assert_eq!(cfg.max_concurrent, 1);
    assert!(cfg.validate().is_ok());
    assert!(cfg.default_admit_timeout().is_none());
}

#[test]
fn test_invalid_max_concurrent() {
    let cfg = GateConfig {
        max_concurrent: 0,
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_history_capacity() {
    let cfg = GateConfig {
        history: HistoryBackendConfig::InMemory { capacity: 0 },
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_history_path() {
    let cfg = GateConfig {
        history: HistoryBackendConfig::JsonLines { path: "".into() },
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_timeout() {
    let cfg = GateConfig {
        default_admit_timeout_secs: Some(0),
        ..GateConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_str() {
    let cfg = GateConfig::from_json_str(
        r#"{
            "max_concurrent": 3,
            "history": { "json_lines": { "path": "/var/lib/convert/history.jsonl" } },
            "default_admit_timeout_secs": 600
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.max_concurrent, 3);
    assert_eq!(
        cfg.history,
        HistoryBackendConfig::JsonLines {
            path: "/var/lib/convert/history.jsonl".into()
        }
    );
    assert_eq!(cfg.default_admit_timeout(), Some(Duration::from_secs(600)));
}

#[test]
fn test_from_json_str_defaults_missing_fields() {
    let cfg = GateConfig::from_json_str(r#"{ "history": "disabled" }"#).unwrap();
    assert_eq!(cfg.max_concurrent, 1);
    assert_eq!(cfg.history, HistoryBackendConfig::Disabled);
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(GateConfig::from_json_str(r#"{ "max_concurrent": 0 }"#).is_err());
    assert!(GateConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup() {
    let vars: HashMap<&str, &str> = [
        (ENV_MAX_CONCURRENT, " 4 "),
        (ENV_HISTORY_PATH, "history.jsonl"),
        (ENV_ADMIT_TIMEOUT_SECS, "30"),
        (ENV_DEFER_HISTORY, "true"),
    ]
    .into_iter()
    .collect();
    let cfg = GateConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.max_concurrent, 4);
    assert_eq!(
        cfg.history,
        HistoryBackendConfig::JsonLines {
            path: "history.jsonl".into()
        }
    );
    assert_eq!(cfg.default_admit_timeout_secs, Some(30));
    assert!(cfg.defer_history);
}

#[test]
fn test_from_lookup_malformed() {
    let err = GateConfig::from_lookup(|key| (key == ENV_MAX_CONCURRENT).then(|| "many".to_string()))
        .unwrap_err();
    assert!(err.contains(ENV_MAX_CONCURRENT));
}

#[test]
fn test_from_lookup_malformed_defer_flag() {
    let err = GateConfig::from_lookup(|key| (key == ENV_DEFER_HISTORY).then(|| "sometimes".to_string()))
        .unwrap_err();
    assert!(err.contains(ENV_DEFER_HISTORY));
}
