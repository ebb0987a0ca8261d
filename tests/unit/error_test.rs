//! Tests for error types

use keyed_task_queue::core::{is_cancellation, Cancelled, SchedulerError};

#[test]
fn test_duplicate_key_error() {
    let err = SchedulerError::DuplicateKey("\"a\" (waiting)".to_string());
    assert_eq!(
        format!("{}", err),
        "duplicate key: task \"a\" (waiting) is already waiting or in progress"
    );
}

#[test]
fn test_key_not_found_error() {
    let err = SchedulerError::KeyNotFound("missing".to_string());
    assert_eq!(format!("{}", err), "key not found: missing");
}

#[test]
fn test_invalid_state_error() {
    let err = SchedulerError::InvalidState("task 7 is not in the waiting set".to_string());
    assert_eq!(format!("{}", err), "invalid state: task 7 is not in the waiting set");
}

#[test]
fn test_closed_error() {
    assert_eq!(format!("{}", SchedulerError::Closed), "task queue is closed");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("max_concurrent_tasks must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_concurrent_tasks must be greater than 0"
    );
}

#[test]
fn test_scheduler_error_converts_to_anyhow() {
    let err: anyhow::Error = SchedulerError::Closed.into();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
    assert!(!is_cancellation(&err));
}

#[test]
fn test_cancelled_display() {
    assert_eq!(format!("{}", Cancelled), "task was cancelled");
    assert!(is_cancellation(&anyhow::Error::new(Cancelled)));
}
