//! Introspection models for an operations UI.

use serde::{Deserialize, Serialize};

use crate::core::{TaskScheduler, TaskStatus};

/// Point-in-time view of the tracked keys.
///
/// The three lists are read one after another, so a key that changes state in
/// between may show up in two of them or in none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot<K> {
    /// Waiting keys in enqueue order.
    pub waiting: Vec<K>,
    /// In-progress keys, including cancelling ones.
    pub in_progress: Vec<K>,
    /// In-progress keys whose cancellation was requested.
    pub cancelling: Vec<K>,
}

impl<K> QueueSnapshot<K> {
    /// Total number of tracked keys.
    #[must_use]
    pub fn total(&self) -> usize {
        self.waiting.len() + self.in_progress.len()
    }
}

/// Task status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusResponse<K> {
    /// Task key.
    pub key: K,
    /// Current status, `None` when the key is not tracked.
    pub status: Option<TaskStatus>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// `false` once the queue has been closed and refuses new work.
    pub ok: bool,
    /// Keys whose cancellation is pending; a growing list points to stuck work.
    pub cancelling: usize,
}

/// Take a snapshot of every tracked key.
pub fn snapshot<S>(scheduler: &S) -> QueueSnapshot<S::Key>
where
    S: TaskScheduler + ?Sized,
{
    QueueSnapshot {
        waiting: scheduler.waiting_keys(),
        in_progress: scheduler.in_progress_keys(),
        cancelling: scheduler.cancelling_keys(),
    }
}

/// Report the status of one key.
pub fn task_status<S>(scheduler: &S, key: S::Key) -> TaskStatusResponse<S::Key>
where
    S: TaskScheduler + ?Sized,
{
    let status = scheduler.status(&key);
    TaskStatusResponse { key, status }
}

/// Return a health payload.
pub fn health<S>(scheduler: &S) -> Health
where
    S: TaskScheduler + ?Sized,
{
    Health {
        ok: !scheduler.is_closed(),
        cancelling: scheduler.cancelling_keys().len(),
    }
}
