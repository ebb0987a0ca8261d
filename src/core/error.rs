//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by the task manager and the worker loop.
///
/// Structural errors are contract violations by the caller and are returned
/// synchronously. Failures of the work itself never surface here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The key is already waiting or in progress.
    #[error("duplicate key: task {0} is already waiting or in progress")]
    DuplicateKey(String),
    /// The key is not present in the set the operation targets.
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// The key is not in the state the transition requires.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// The queue was closed and accepts no more work.
    #[error("task queue is closed")]
    Closed,
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for work items and handlers.
pub type AppResult<T> = Result<T, anyhow::Error>;
