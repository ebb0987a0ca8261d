//! Builders to construct a worker loop from configuration.

use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::core::{SchedulerError, Spawn, TaskTracker, WorkerLoop};

/// Build a worker loop over `tracker` from validated configuration.
///
/// # Errors
///
/// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
pub fn build_worker<T, S>(
    cfg: &WorkerConfig,
    tracker: Arc<T>,
    spawner: S,
) -> Result<WorkerLoop<T, S>, SchedulerError>
where
    T: TaskTracker + 'static,
    S: Spawn + Send + Sync + 'static,
{
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidConfig(format!("config invalid: {e}")))?;

    let worker = WorkerLoop::new(tracker, spawner, cfg.max_concurrent_tasks)?;
    tracing::debug!(
        worker_id = %worker.worker_id(),
        max_concurrent_tasks = cfg.max_concurrent_tasks,
        "built task worker"
    );
    Ok(worker)
}
