//! Indexer data model
//!
//! Extraction rules (`IndexerConfig`), the jobs that reference them, and the
//! registry used to follow `nextIndexerId` chains.

pub mod config;
pub mod job;
pub mod registry;

pub use config::{IndexType, IndexerConfig, IndexerId, Replacement, Selector};
pub use job::{DataToIndex, IndexResponse, IndexTarget, IndexedValue, Job, Lane, OneOrMany};
pub use registry::IndexerRegistry;
