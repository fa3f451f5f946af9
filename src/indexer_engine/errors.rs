//! Per-job error types
//!
//! Every variant is terminal for one attempt: the worker converts it into a
//! `Failure` result and moves on. Rate-limit deferral is not
//! an error and never appears here.

use serde::Serialize;

use crate::indexer::IndexerId;

/// Coarse classification reported upstream with each failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Page failed to load
    Navigation,
    /// Selector, click, chain, or evaluation problem
    Extraction,
    /// Browser could not provide an isolated context or page
    ContextCreation,
}

/// Error raised while executing one job
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexerError {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Clicking '{selector}' failed: {message}")]
    Click { selector: String, message: String },

    #[error("No selector of indexer {indexer} matched")]
    NothingMatched { indexer: String },

    #[error("Indexer {indexer} has no selectors")]
    NoSelectors { indexer: String },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Could not open browser context: {0}")]
    ContextCreation(String),

    #[error("Indexer chain revisits indexer {id}")]
    ChainCycle { id: IndexerId },

    #[error("Indexer chain is longer than {max_depth} links")]
    ChainDepthExceeded { max_depth: usize },

    #[error("Indexer {id} referenced by nextIndexerId was not provided")]
    UnknownIndexer { id: IndexerId },

    #[error("{operation} timed out after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    #[error("Job aborted: {0}")]
    Panicked(String),
}

impl IndexerError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Navigation { .. } => FailureKind::Navigation,
            Self::ContextCreation(_) => FailureKind::ContextCreation,
            _ => FailureKind::Extraction,
        }
    }

    pub fn extraction(err: impl std::fmt::Display) -> Self {
        Self::Extraction(err.to_string())
    }
}
