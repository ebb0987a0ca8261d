//! Runtime adapters and the introspection API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, snapshot, task_status, Health, QueueSnapshot, TaskStatusResponse};
pub use tokio_spawner::TokioSpawner;
