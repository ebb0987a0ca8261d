//! Per-task cancellation controllers and signal merging.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Signal handed to a running work item. Cheap to clone.
pub type CancelSignal = CancellationToken;

/// Owns the cancellation source of one in-progress task.
///
/// Minted when a key moves to in-progress and dropped when the key completes.
#[derive(Debug, Default)]
pub struct CancellationController {
    token: CancellationToken,
}

impl CancellationController {
    /// Create a controller whose signal has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal observed by the running work.
    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        self.token.clone()
    }

    /// Request cancellation. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancellation_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Error a work item returns when it stopped because its signal fired.
#[derive(Debug, Clone, Copy, Error)]
#[error("task was cancelled")]
pub struct Cancelled;

/// Returns true when `err` (or anything in its chain) is a [`Cancelled`].
#[must_use]
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Cancelled>())
}

/// Drive `fut` to completion, cancelling `merged` as soon as `lifecycle` fires.
///
/// `merged` is expected to be a child of the per-task signal, so it ends up
/// cancelled when either source fires.
pub(crate) async fn forward_cancellation<F>(
    fut: F,
    merged: &CancellationToken,
    lifecycle: &CancellationToken,
) -> F::Output
where
    F: Future,
{
    tokio::pin!(fut);
    tokio::select! {
        out = &mut fut => out,
        () = lifecycle.cancelled() => {
            merged.cancel();
            fut.await
        }
    }
}
