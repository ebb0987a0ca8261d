//! Tests for builder modules

use std::sync::Arc;

use keyed_task_queue::builders::build_worker;
use keyed_task_queue::config::WorkerConfig;
use keyed_task_queue::core::{SchedulerError, TaskManager};
use keyed_task_queue::runtime::TokioSpawner;

#[tokio::test]
async fn test_build_worker_from_config() {
    let manager = Arc::new(TaskManager::<u64>::new());
    let worker = build_worker(&WorkerConfig::new(4), manager, TokioSpawner::current()).unwrap();

    let mut handle = worker.start();
    assert_eq!(handle.max_concurrent_tasks(), 4);
    assert!(handle.is_running());
    handle.shutdown().await;
    assert!(!handle.is_running());
}

#[tokio::test]
async fn test_build_worker_rejects_invalid_config() {
    let manager = Arc::new(TaskManager::<u64>::new());
    let result = build_worker(&WorkerConfig::new(0), manager, TokioSpawner::current());
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
