//! Resolution of `nextIndexerId` references
//!
//! A job carries the head of each chain plus the chain members it refers
//! to. The registry indexes them by id and walks the chain with a depth
//! bound and a visited set, since nothing upstream prevents cycles.

use std::collections::{HashMap, HashSet};

use super::config::{IndexerConfig, IndexerId};
use crate::indexer_engine::IndexerError;

/// Lookup table of indexers by id
#[derive(Debug, Clone, Default)]
pub struct IndexerRegistry {
    by_id: HashMap<IndexerId, IndexerConfig>,
}

impl IndexerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every config reachable in `configs`,
    /// including inline `nextIndexer` definitions
    pub fn from_configs<'a>(configs: impl IntoIterator<Item = &'a IndexerConfig>) -> Self {
        let mut registry = Self::new();
        for config in configs {
            registry.insert(config);
        }
        registry
    }

    /// Register a config and its inline successors
    ///
    /// Configs without an id cannot be referenced and are skipped. The first
    /// definition of an id wins.
    pub fn insert(&mut self, config: &IndexerConfig) {
        let mut current = Some(config);
        while let Some(cfg) = current {
            if let Some(id) = &cfg.id {
                self.by_id.entry(id.clone()).or_insert_with(|| cfg.clone());
            }
            current = cfg.next_indexer.as_deref();
        }
    }

    #[must_use]
    pub fn get(&self, id: &IndexerId) -> Option<&IndexerConfig> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Flatten the chain starting at `head` into evaluation order
    ///
    /// Fails with `ChainCycle` if an id repeats, `UnknownIndexer` if a
    /// reference cannot be resolved, and `ChainDepthExceeded` if the chain
    /// is longer than `max_depth` links.
    pub fn resolve_chain<'a>(
        &'a self,
        head: &'a IndexerConfig,
        max_depth: usize,
    ) -> Result<Vec<&'a IndexerConfig>, IndexerError> {
        let mut chain = Vec::new();
        let mut visited: HashSet<&IndexerId> = HashSet::new();
        let mut current = Some(head);

        while let Some(config) = current {
            if chain.len() >= max_depth {
                return Err(IndexerError::ChainDepthExceeded { max_depth });
            }
            if let Some(id) = &config.id
                && !visited.insert(id)
            {
                return Err(IndexerError::ChainCycle { id: id.clone() });
            }
            chain.push(config);

            current = if let Some(next) = config.next_indexer.as_deref() {
                Some(next)
            } else if let Some(next_id) = &config.next_indexer_id {
                Some(
                    self.get(next_id)
                        .ok_or_else(|| IndexerError::UnknownIndexer { id: next_id.clone() })?,
                )
            } else {
                None
            };
        }

        Ok(chain)
    }
}
