//! Tests for configuration validation

use keyed_task_queue::config::{WorkerConfig, DEFAULT_MAX_CONCURRENT_TASKS, MAX_CONCURRENT_TASKS_KEY};

#[test]
fn test_worker_config_default() {
    let cfg = WorkerConfig::default();
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
    assert_eq!(cfg.max_concurrent_tasks, 3);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_worker_config_invalid_zero() {
    assert!(WorkerConfig::new(0).validate().is_err());
}

#[test]
fn test_worker_config_from_json() {
    let cfg = WorkerConfig::from_json_str(r#"{ "max_concurrent_tasks": 5 }"#).unwrap();
    assert_eq!(cfg, WorkerConfig::new(5));
}

#[test]
fn test_worker_config_from_json_uses_default() {
    let cfg = WorkerConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
}

#[test]
fn test_worker_config_from_json_rejects_zero() {
    let err = WorkerConfig::from_json_str(r#"{ "max_concurrent_tasks": 0 }"#).unwrap_err();
    assert!(err.contains("greater than 0"));
}

#[test]
fn test_worker_config_from_json_parse_error() {
    let err = WorkerConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_worker_config_from_lookup() {
    let cfg = WorkerConfig::from_lookup(|key| {
        (key == MAX_CONCURRENT_TASKS_KEY).then(|| " 8 ".to_string())
    })
    .unwrap();
    assert_eq!(cfg.max_concurrent_tasks, 8);
}

#[test]
fn test_worker_config_from_lookup_missing_uses_default() {
    let cfg = WorkerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, WorkerConfig::default());
}

#[test]
fn test_worker_config_from_lookup_rejects_garbage() {
    assert!(WorkerConfig::from_lookup(|_| Some("many".to_string())).is_err());
    assert!(WorkerConfig::from_lookup(|_| Some("-1".to_string())).is_err());
    assert!(WorkerConfig::from_lookup(|_| Some("0".to_string())).is_err());
}
