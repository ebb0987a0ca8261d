//! Tests for utility functions

use keyed_task_queue::util::{init_tracing, DEFAULT_LOG_FILTER};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}

#[test]
fn test_default_log_filter_targets_crate() {
    assert!(DEFAULT_LOG_FILTER.starts_with("keyed_task_queue"));
    assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
}
