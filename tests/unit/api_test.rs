//! Tests for the introspection API

use keyed_task_queue::core::{work_item, TaskManager, TaskScheduler, TaskStatus, TaskTracker};
use keyed_task_queue::runtime::api::{health, snapshot, task_status};

fn noop() -> keyed_task_queue::core::WorkItem {
    work_item(|_signal| async { Ok(()) })
}

#[test]
fn test_snapshot_reports_every_set() {
    let manager = TaskManager::<u32>::new();
    for key in 1..=4 {
        manager.enqueue(key, noop(), None).unwrap();
    }
    manager.move_to_in_progress(&1).unwrap();
    manager.move_to_in_progress(&2).unwrap();
    manager.cancel_in_progress(&2).unwrap();

    let snap = snapshot(&manager);
    assert_eq!(snap.waiting, vec![3, 4]);
    let mut in_progress = snap.in_progress.clone();
    in_progress.sort_unstable();
    assert_eq!(in_progress, vec![1, 2]);
    assert_eq!(snap.cancelling, vec![2]);
    assert_eq!(snap.total(), 4);
}

#[test]
fn test_snapshot_serializes() {
    let manager = TaskManager::<String>::new();
    manager.enqueue("digest-1".to_string(), noop(), None).unwrap();

    let json = serde_json::to_value(snapshot(&manager)).unwrap();
    assert_eq!(json["waiting"][0], "digest-1");
    assert!(json["in_progress"].as_array().unwrap().is_empty());
}

#[test]
fn test_task_status_response() {
    let manager = TaskManager::<u32>::new();
    manager.enqueue(9, noop(), None).unwrap();

    let resp = task_status(&manager, 9);
    assert_eq!(resp.status, Some(TaskStatus::Waiting));
    assert_eq!(serde_json::to_value(&resp).unwrap()["status"], "waiting");

    manager.move_to_in_progress(&9).unwrap();
    manager.cancel_in_progress(&9).unwrap();
    assert_eq!(task_status(&manager, 9).status, Some(TaskStatus::Cancelling));

    manager.complete(&9).unwrap();
    assert_eq!(task_status(&manager, 9).status, None);
}

#[test]
fn test_health_counts_cancelling() {
    let manager = TaskManager::<u32>::new();
    manager.enqueue(1, noop(), None).unwrap();
    manager.move_to_in_progress(&1).unwrap();
    assert_eq!(health(&manager).cancelling, 0);

    manager.cancel_all();
    let h = health(&manager);
    assert!(h.ok);
    assert_eq!(h.cancelling, 1);
}

#[test]
fn test_health_reports_closed_queue() {
    let manager = TaskManager::<u32>::new();
    assert!(health(&manager).ok);

    manager.close();
    let h = health(&manager);
    assert!(!h.ok);
    assert_eq!(serde_json::to_value(&h).unwrap()["ok"], false);
}
