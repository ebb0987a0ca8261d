//! # Keyed Task Queue
//!
//! Bounded, cancellable, uniquely-keyed background task scheduling on tokio.
//!
//! Work is enqueued under a key (for example a digest id), waits in a FIFO queue,
//! and is executed by a single supervisory worker loop that never runs more than a
//! configured number of tasks at once. Every running task can be cancelled
//! individually, and all of them observe the worker's lifecycle shutdown.
//!
//! ## Key Features
//!
//! - **Unique keys**: a key is either waiting or in progress, never both, never twice
//! - **Strict FIFO**: dequeue order follows enqueue order
//! - **Bounded parallelism**: a semaphore permit is held for each execution
//! - **Two-layer cancellation**: per-key signal merged with the lifecycle signal
//! - **Contained failures**: work errors go to an optional handler, never to the loop
//! - **Key reuse**: a completed key can be enqueued again immediately
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keyed_task_queue::builders::build_worker;
//! use keyed_task_queue::config::WorkerConfig;
//! use keyed_task_queue::core::{error_handler, work_item, TaskManager, TaskScheduler};
//! use keyed_task_queue::runtime::TokioSpawner;
//!
//! let manager = Arc::new(TaskManager::<uuid::Uuid>::new());
//! let mut worker = build_worker(
//!     &WorkerConfig::from_env()?,
//!     Arc::clone(&manager),
//!     TokioSpawner::current(),
//! )?
//! .start();
//!
//! manager.enqueue(
//!     digest_id,
//!     work_item(move |signal| async move { generate_digest(digest_id, signal).await }),
//!     Some(error_handler(|err| async move {
//!         tracing::warn!(error = ?err, "digest failed");
//!         Ok(())
//!     })),
//! )?;
//!
//! // ... later
//! worker.shutdown().await;
//! worker.drain(std::time::Duration::from_secs(5)).await;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Configuration models for the worker loop.
pub mod config;
/// Core scheduling abstractions and the worker loop.
pub mod core;
/// Runtime adapters and the introspection API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
