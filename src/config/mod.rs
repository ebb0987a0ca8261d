//! Configuration models for the worker loop.

pub mod worker;

pub use worker::{WorkerConfig, DEFAULT_MAX_CONCURRENT_TASKS, MAX_CONCURRENT_TASKS_KEY};
