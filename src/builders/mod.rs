//! Builders to construct scheduler components from configuration.

pub mod worker_builder;

pub use worker_builder::build_worker;
