//! Keys, work items, failure handlers, and the entries that flow through the queue.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;

use async_trait::async_trait;

use super::{AppResult, CancelSignal};

/// Marker trait for keys identifying one logical unit of work.
///
/// Any comparable, hashable, cloneable type qualifies (e.g. a `Uuid` digest id).
pub trait TaskKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// Blanket implementation: any type meeting the requirements is a `TaskKey`.
impl<T> TaskKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of work: receives the merged cancellation signal and runs to completion.
///
/// Returning `Err` marks the execution as failed; the error is forwarded to the
/// entry's [`ErrorHandler`] if one was supplied.
pub type WorkItem = Box<dyn FnOnce(CancelSignal) -> BoxFuture<'static, AppResult<()>> + Send>;

/// Box an async closure as a [`WorkItem`].
///
/// ```rust,ignore
/// let work = work_item(|signal| async move {
///     tokio::select! {
///         () = signal.cancelled() => Err(Cancelled.into()),
///         () = summarize() => Ok(()),
///     }
/// });
/// ```
pub fn work_item<F, Fut>(f: F) -> WorkItem
where
    F: FnOnce(CancelSignal) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(move |signal| Box::pin(f(signal)))
}

/// Callback invoked with the error of a failed work item.
///
/// Called at most once per execution. Its own failure is logged and otherwise
/// ignored; it never stops the worker loop.
#[async_trait]
pub trait ErrorHandler: Send + Sync + 'static {
    /// Handle the failure of the work item this handler was enqueued with.
    async fn on_error(&self, error: anyhow::Error) -> AppResult<()>;
}

#[async_trait]
impl<F, Fut> ErrorHandler for F
where
    F: Fn(anyhow::Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    async fn on_error(&self, error: anyhow::Error) -> AppResult<()> {
        (self)(error).await
    }
}

/// Box an async closure as an [`ErrorHandler`].
pub fn error_handler<F, Fut>(f: F) -> Box<dyn ErrorHandler>
where
    F: Fn(anyhow::Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(f)
}

/// Entry flowing through the FIFO queue.
pub struct QueueEntry<K> {
    /// The work to run.
    pub work: WorkItem,
    /// Optional failure callback.
    pub on_error: Option<Box<dyn ErrorHandler>>,
    /// Key the work was enqueued under.
    pub key: K,
    /// Sequence number of the enqueue that produced this entry.
    ///
    /// Distinguishes this entry from a later enqueue of the same key.
    pub seq: u64,
}

impl<K: fmt::Debug> fmt::Debug for QueueEntry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("key", &self.key)
            .field("seq", &self.seq)
            .field("has_error_handler", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
