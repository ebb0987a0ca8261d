//! Shared state store for keyed tasks, with its producer and consumer facades.
//!
//! A key is in exactly one of three places at any instant: waiting, in progress,
//! or absent. Both maps and the FIFO queue live behind one `parking_lot::Mutex`
//! so every transition is a single short critical section. The lock is never
//! held across an `.await`; `dequeue` parks on a `Notify` instead.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::core::{
    CancelSignal, CancellationController, ErrorHandler, QueueEntry, SchedulerError, TaskKey,
    WorkItem,
};

/// Externally visible state of a tracked key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Enqueued, not yet started.
    Waiting,
    /// Started, cancellation not requested.
    InProgress,
    /// Started, cancellation requested but the work has not completed yet.
    Cancelling,
}

/// Producer-facing operations.
pub trait TaskScheduler: Send + Sync {
    /// Key type identifying tasks.
    type Key: TaskKey;

    /// Enqueue `work` under `key`.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::DuplicateKey` if `key` is waiting or in progress
    /// - `SchedulerError::Closed` if the queue has been closed
    fn enqueue(
        &self,
        key: Self::Key,
        work: WorkItem,
        on_error: Option<Box<dyn ErrorHandler>>,
    ) -> Result<(), SchedulerError>;

    /// Remove a waiting key so it never runs.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::KeyNotFound` if `key` is not waiting.
    fn remove_waiting(&self, key: &Self::Key) -> Result<(), SchedulerError>;

    /// Snapshot of waiting keys, in enqueue order.
    fn waiting_keys(&self) -> Vec<Self::Key>;

    /// Snapshot of in-progress keys.
    fn in_progress_keys(&self) -> Vec<Self::Key>;

    /// In-progress keys whose cancellation was requested but which have not completed.
    fn cancelling_keys(&self) -> Vec<Self::Key>;

    /// Current status of `key`, or `None` if it is not tracked.
    fn status(&self, key: &Self::Key) -> Option<TaskStatus>;

    /// Request cancellation of an in-progress key. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::KeyNotFound` if `key` is not in progress.
    fn cancel_in_progress(&self, key: &Self::Key) -> Result<(), SchedulerError>;

    /// Request cancellation of every in-progress key. Waiting keys are untouched.
    fn cancel_all(&self);

    /// Whether the queue refuses new work.
    fn is_closed(&self) -> bool;
}

/// Consumer-facing operations used by the worker loop.
#[async_trait]
pub trait TaskTracker: Send + Sync {
    /// Key type identifying tasks.
    type Key: TaskKey;

    /// Wait for the next entry in FIFO order.
    ///
    /// The key stays in the waiting set until `move_to_in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Closed` once the queue is closed and empty.
    async fn dequeue(&self) -> Result<QueueEntry<Self::Key>, SchedulerError>;

    /// Move a waiting key to in progress and return its fresh cancellation signal.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidState` if `key` is not waiting.
    fn move_to_in_progress(&self, key: &Self::Key) -> Result<CancelSignal, SchedulerError>;

    /// Like [`TaskTracker::move_to_in_progress`], but only if the waiting slot
    /// still belongs to the enqueue numbered `seq`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidState` if `key` is not waiting, or is
    /// waiting under a later enqueue. The later entry is left waiting.
    fn move_entry_to_in_progress(
        &self,
        key: &Self::Key,
        seq: u64,
    ) -> Result<CancelSignal, SchedulerError>;

    /// Remove an in-progress key and dispose its controller.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::KeyNotFound` if `key` is not in progress.
    fn complete(&self, key: &Self::Key) -> Result<(), SchedulerError>;

    /// Like [`TaskTracker::complete`], reporting absence as `false`.
    fn try_complete(&self, key: &Self::Key) -> bool;

    /// Request cancellation of every in-progress key.
    fn cancel_all_in_progress(&self);
}

struct State<K> {
    /// Waiting keys mapped to their enqueue sequence number.
    waiting: HashMap<K, u64>,
    in_progress: HashMap<K, CancellationController>,
    queue: VecDeque<QueueEntry<K>>,
    next_seq: u64,
    closed: bool,
}

/// In-process store tracking keyed tasks through waiting and in-progress.
///
/// Implements both [`TaskScheduler`] and [`TaskTracker`]; share it behind an
/// `Arc` between the orchestrator and the worker loop.
pub struct TaskManager<K: TaskKey> {
    state: Mutex<State<K>>,
    available: Notify,
}

impl<K: TaskKey> Default for TaskManager<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: TaskKey> TaskManager<K> {
    /// Create an empty, open task manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                waiting: HashMap::new(),
                in_progress: HashMap::new(),
                queue: VecDeque::new(),
                next_seq: 0,
                closed: false,
            }),
            available: Notify::new(),
        }
    }

    /// Close the queue.
    ///
    /// Further `enqueue` calls fail with `SchedulerError::Closed`. Entries already
    /// queued are still handed out by `dequeue`, which returns `Closed` once empty.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        info!("task queue closed");
        self.available.notify_waiters();
    }

    /// Number of entries currently queued for dequeue.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    fn transition_to_in_progress(
        &self,
        key: &K,
        expected_seq: Option<u64>,
    ) -> Result<CancelSignal, SchedulerError> {
        let mut state = self.state.lock();
        match (state.waiting.get(key), expected_seq) {
            (None, _) => {
                return Err(SchedulerError::InvalidState(format!(
                    "task {key:?} is not in the waiting set"
                )));
            }
            (Some(&current), Some(expected)) if current != expected => {
                return Err(SchedulerError::InvalidState(format!(
                    "task {key:?} entry {expected} was superseded by entry {current}"
                )));
            }
            _ => {}
        }
        state.waiting.remove(key);
        let controller = CancellationController::new();
        let signal = controller.signal();
        state.in_progress.insert(key.clone(), controller);
        Ok(signal)
    }

    fn cancel_every_in_progress(&self) {
        let state = self.state.lock();
        for controller in state.in_progress.values() {
            controller.cancel();
        }
        debug!(count = state.in_progress.len(), "cancellation requested for all in-progress tasks");
    }
}

impl<K: TaskKey> TaskScheduler for TaskManager<K> {
    type Key = K;

    fn enqueue(
        &self,
        key: K,
        work: WorkItem,
        on_error: Option<Box<dyn ErrorHandler>>,
    ) -> Result<(), SchedulerError> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SchedulerError::Closed);
            }
            if state.in_progress.contains_key(&key) {
                return Err(SchedulerError::DuplicateKey(format!("{key:?} (in progress)")));
            }
            if state.waiting.contains_key(&key) {
                return Err(SchedulerError::DuplicateKey(format!("{key:?} (waiting)")));
            }

            let seq = state.next_seq;
            state.next_seq += 1;
            state.waiting.insert(key.clone(), seq);
            state.queue.push_back(QueueEntry {
                work,
                on_error,
                key: key.clone(),
                seq,
            });
        }

        debug!(key = ?key, "task enqueued");
        self.available.notify_one();
        Ok(())
    }

    fn remove_waiting(&self, key: &K) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if state.waiting.remove(key).is_none() {
            return Err(SchedulerError::KeyNotFound(format!(
                "{key:?} is not in the waiting set"
            )));
        }
        state.queue.retain(|entry| &entry.key != key);
        drop(state);

        debug!(key = ?key, "waiting task removed");
        Ok(())
    }

    fn waiting_keys(&self) -> Vec<K> {
        let state = self.state.lock();
        let mut keys: Vec<(&K, u64)> = state.waiting.iter().map(|(k, seq)| (k, *seq)).collect();
        keys.sort_unstable_by_key(|(_, seq)| *seq);
        keys.into_iter().map(|(k, _)| k.clone()).collect()
    }

    fn in_progress_keys(&self) -> Vec<K> {
        self.state.lock().in_progress.keys().cloned().collect()
    }

    fn cancelling_keys(&self) -> Vec<K> {
        self.state
            .lock()
            .in_progress
            .iter()
            .filter(|(_, controller)| controller.is_cancellation_requested())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn status(&self, key: &K) -> Option<TaskStatus> {
        let state = self.state.lock();
        if state.waiting.contains_key(key) {
            return Some(TaskStatus::Waiting);
        }
        state.in_progress.get(key).map(|controller| {
            if controller.is_cancellation_requested() {
                TaskStatus::Cancelling
            } else {
                TaskStatus::InProgress
            }
        })
    }

    fn cancel_in_progress(&self, key: &K) -> Result<(), SchedulerError> {
        let state = self.state.lock();
        let controller = state.in_progress.get(key).ok_or_else(|| {
            SchedulerError::KeyNotFound(format!("{key:?} is not in the in-progress set"))
        })?;
        if !controller.is_cancellation_requested() {
            controller.cancel();
            debug!(key = ?key, "cancellation requested");
        }
        Ok(())
    }

    fn cancel_all(&self) {
        self.cancel_every_in_progress();
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl<K: TaskKey> TaskTracker for TaskManager<K> {
    type Key = K;

    async fn dequeue(&self) -> Result<QueueEntry<K>, SchedulerError> {
        loop {
            // Register interest before checking so a concurrent enqueue cannot be missed.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(entry) = state.queue.pop_front() {
                    return Ok(entry);
                }
                if state.closed {
                    return Err(SchedulerError::Closed);
                }
            }

            notified.await;
        }
    }

    fn move_to_in_progress(&self, key: &K) -> Result<CancelSignal, SchedulerError> {
        self.transition_to_in_progress(key, None)
    }

    fn move_entry_to_in_progress(&self, key: &K, seq: u64) -> Result<CancelSignal, SchedulerError> {
        self.transition_to_in_progress(key, Some(seq))
    }

    fn complete(&self, key: &K) -> Result<(), SchedulerError> {
        let controller = self.state.lock().in_progress.remove(key);
        match controller {
            Some(controller) => {
                drop(controller);
                Ok(())
            }
            None => Err(SchedulerError::KeyNotFound(format!(
                "{key:?} is not in the in-progress set"
            ))),
        }
    }

    fn try_complete(&self, key: &K) -> bool {
        self.complete(key).is_ok()
    }

    fn cancel_all_in_progress(&self) {
        self.cancel_every_in_progress();
    }
}
