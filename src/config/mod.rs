//! Configuration module for the indexer worker
//!
//! This module provides the `WorkerConfig` struct, its type-safe builder and
//! environment loading.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, WithEndpoint, WorkerConfigBuilder};
pub use types::{ConfigError, WorkerConfig};
