//! Supervisory worker loop executing queued tasks with bounded parallelism.
//!
//! One loop pulls entries from a [`TaskTracker`], holds a semaphore permit for
//! each execution, and spawns every execution detached so the next iteration can
//! start right away. Executions observe the merge of their own cancellation
//! signal and the loop's lifecycle signal.
//!
//! # Shutdown
//!
//! [`WorkerHandle::shutdown`] only signals cancellation and waits for the loop
//! itself. Detached executions may still be running when it returns; call
//! [`WorkerHandle::drain`] afterwards to wait for them.
//!
//! # Runtime context
//!
//! Each execution is handed to the loop's [`Spawn`] implementation. Inside it,
//! the work item and its error handler run as tokio tasks spawned from that
//! execution, so they land on the same runtime the spawner targets. A spawner
//! must therefore drive its futures on a tokio runtime.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::cancellation::forward_cancellation;
use crate::core::{
    is_cancellation, AppResult, ErrorHandler, QueueEntry, SchedulerError, TaskKey, TaskTracker,
};

/// Abstraction for spawning detached executions on a runtime.
///
/// Spawned futures call `tokio::spawn` internally, so implementations must run
/// them inside a tokio runtime context.
pub trait Spawn {
    /// Spawn a future without waiting for it.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

enum LoopControl {
    Continue,
    Stop,
}

/// Worker loop bound to one tracker and one permit limiter.
pub struct WorkerLoop<T, S>
where
    T: TaskTracker + 'static,
{
    tracker: Arc<T>,
    spawner: S,
    permits: Arc<Semaphore>,
    max_concurrent_tasks: u32,
    worker_id: Uuid,
}

impl<T, S> WorkerLoop<T, S>
where
    T: TaskTracker + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a worker loop allowing at most `max_concurrent_tasks` executions.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if `max_concurrent_tasks` is zero.
    pub fn new(tracker: Arc<T>, spawner: S, max_concurrent_tasks: u32) -> Result<Self, SchedulerError> {
        if max_concurrent_tasks == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_concurrent_tasks must be greater than 0".into(),
            ));
        }
        Ok(Self {
            tracker,
            spawner,
            permits: Arc::new(Semaphore::new(max_concurrent_tasks as usize)),
            max_concurrent_tasks,
            worker_id: Uuid::new_v4(),
        })
    }

    /// Identifier used in this worker's log records.
    #[must_use]
    pub const fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    /// Start the loop on the current tokio runtime and return a handle to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn start(self) -> WorkerHandle<T> {
        let lifecycle = CancellationToken::new();
        let tracker = Arc::clone(&self.tracker);
        let permits = Arc::clone(&self.permits);
        let max_concurrent_tasks = self.max_concurrent_tasks;
        let worker_id = self.worker_id;

        let handle = tokio::spawn(self.run(lifecycle.clone()));

        WorkerHandle {
            worker_id,
            lifecycle,
            tracker,
            permits,
            max_concurrent_tasks,
            handle: Some(handle),
        }
    }

    /// Run the loop until `lifecycle` is cancelled or the queue is closed and empty.
    pub async fn run(self, lifecycle: CancellationToken) {
        info!(
            worker_id = %self.worker_id,
            max_concurrent_tasks = self.max_concurrent_tasks,
            "task worker started"
        );

        while !lifecycle.is_cancelled() {
            match self.process_single_task(&lifecycle).await {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Stop) => break,
                Err(e) => {
                    error!(
                        worker_id = %self.worker_id,
                        error = ?e,
                        "unhandled error in task worker loop, continuing"
                    );
                    tokio::task::yield_now().await;
                }
            }
        }

        info!(worker_id = %self.worker_id, "task worker stopped");
    }

    async fn process_single_task(&self, lifecycle: &CancellationToken) -> AppResult<LoopControl> {
        let permit = tokio::select! {
            () = lifecycle.cancelled() => return Ok(LoopControl::Stop),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.context("task permit limiter closed")?
            }
        };

        let entry = tokio::select! {
            () = lifecycle.cancelled() => return Ok(LoopControl::Stop),
            entry = self.tracker.dequeue() => match entry {
                Ok(entry) => entry,
                Err(SchedulerError::Closed) => {
                    info!(worker_id = %self.worker_id, "task queue closed and drained");
                    return Ok(LoopControl::Stop);
                }
                Err(e) => return Err(e).context("failed to dequeue task"),
            },
        };

        debug!(worker_id = %self.worker_id, key = ?entry.key, "dequeued task");
        self.spawn_execution(entry, permit, lifecycle.clone());
        Ok(LoopControl::Continue)
    }

    fn spawn_execution(
        &self,
        entry: QueueEntry<T::Key>,
        permit: OwnedSemaphorePermit,
        lifecycle: CancellationToken,
    ) {
        let tracker = Arc::clone(&self.tracker);
        let worker_id = self.worker_id;

        self.spawner.spawn(async move {
            let QueueEntry {
                work,
                on_error,
                key,
                seq,
            } = entry;
            let mut guard = ExecutionGuard {
                tracker: Arc::clone(&tracker),
                key: None,
                _permit: permit,
            };

            let task_signal = match tracker.move_entry_to_in_progress(&key, seq) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(worker_id = %worker_id, key = ?key, error = %e, "skipping dequeued task");
                    return;
                }
            };
            guard.key = Some(key.clone());

            let merged = task_signal.child_token();
            debug!(worker_id = %worker_id, key = ?key, "task started");

            // Runs on the spawner's runtime; the join handle surfaces panics.
            let execution = tokio::spawn(work(merged.clone()));
            let result = match forward_cancellation(execution, &merged, &lifecycle).await {
                Ok(result) => result,
                Err(join_error) => Err(anyhow::Error::new(join_error).context("task execution panicked or was aborted")),
            };

            match result {
                Ok(()) => info!(worker_id = %worker_id, key = ?key, "task completed"),
                Err(error) => {
                    if is_cancellation(&error) {
                        info!(worker_id = %worker_id, key = ?key, "task cancelled");
                    } else {
                        error!(worker_id = %worker_id, key = ?key, error = ?error, "task failed");
                    }
                    if let Some(handler) = on_error {
                        invoke_error_handler(handler, error, &key).await;
                    }
                }
            }
        });
    }
}

/// Run a failure handler in its own task so neither its error nor its panic escapes.
async fn invoke_error_handler<K: TaskKey>(
    handler: Box<dyn ErrorHandler>,
    error: anyhow::Error,
    key: &K,
) {
    match tokio::spawn(async move { handler.on_error(error).await }).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(key = ?key, error = ?e, "task error handler failed"),
        Err(e) => error!(key = ?key, error = %e, "task error handler panicked"),
    }
}

/// Completes the key (when armed) and then releases the permit, on every exit path.
struct ExecutionGuard<T: TaskTracker> {
    tracker: Arc<T>,
    key: Option<T::Key>,
    _permit: OwnedSemaphorePermit,
}

impl<T: TaskTracker> Drop for ExecutionGuard<T> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            if !self.tracker.try_complete(&key) {
                warn!(key = ?key, "task was no longer in progress at completion");
            }
        }
    }
}

/// Handle for controlling a running worker loop.
pub struct WorkerHandle<T>
where
    T: TaskTracker + 'static,
{
    worker_id: Uuid,
    lifecycle: CancellationToken,
    tracker: Arc<T>,
    permits: Arc<Semaphore>,
    max_concurrent_tasks: u32,
    handle: Option<JoinHandle<()>>,
}

impl<T> WorkerHandle<T>
where
    T: TaskTracker + 'static,
{
    /// Identifier used in this worker's log records.
    #[must_use]
    pub const fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    /// Lifecycle signal merged into every execution.
    #[must_use]
    pub const fn lifecycle_token(&self) -> &CancellationToken {
        &self.lifecycle
    }

    /// Configured concurrency bound.
    #[must_use]
    pub const fn max_concurrent_tasks(&self) -> u32 {
        self.max_concurrent_tasks
    }

    /// Permits not currently held by the loop or an execution.
    #[must_use]
    pub fn permits_available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Whether the supervisory loop is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop: cancel the lifecycle signal, cancel every in-progress
    /// task, and wait for the loop to exit.
    ///
    /// Detached executions are signalled but not awaited; see [`WorkerHandle::drain`].
    pub async fn shutdown(&mut self) {
        info!(worker_id = %self.worker_id, "shutting down task worker");
        self.lifecycle.cancel();
        self.tracker.cancel_all_in_progress();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(worker_id = %self.worker_id, error = %e, "task worker loop ended abnormally");
            }
        }
    }

    /// Wait until every execution has released its permit, or `timeout` elapses.
    ///
    /// Returns `true` if all executions finished. Only meaningful after
    /// [`WorkerHandle::shutdown`], since a running loop holds a permit while it
    /// waits for work.
    pub async fn drain(&self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.permits.acquire_many(self.max_concurrent_tasks)).await {
            Ok(Ok(_all)) => true,
            Ok(Err(_)) => false,
            Err(_) => {
                warn!(
                    worker_id = %self.worker_id,
                    busy = self.max_concurrent_tasks as usize - self.permits.available_permits(),
                    "drain timed out with tasks still executing"
                );
                false
            }
        }
    }
}

impl<T> Drop for WorkerHandle<T>
where
    T: TaskTracker + 'static,
{
    fn drop(&mut self) {
        // Signal only; never block in Drop.
        if self.handle.is_some() && !self.lifecycle.is_cancelled() {
            self.lifecycle.cancel();
            debug!(worker_id = %self.worker_id, "WorkerHandle dropped without shutdown - loop cancelled");
        }
    }
}
