//! Core scheduling abstractions: keyed task tracking, cancellation, and the worker loop.

pub mod cancellation;
pub mod error;
pub mod task;
pub mod task_manager;
pub mod worker;

pub use cancellation::{is_cancellation, CancelSignal, CancellationController, Cancelled};
pub use error::{AppResult, SchedulerError};
pub use task::{
    error_handler, work_item, BoxFuture, ErrorHandler, QueueEntry, TaskKey, WorkItem,
};
pub use task_manager::{TaskManager, TaskScheduler, TaskStatus, TaskTracker};
pub use worker::{Spawn, WorkerHandle, WorkerLoop};
