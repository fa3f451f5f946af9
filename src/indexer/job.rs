//! Jobs as they arrive over the control channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::config::IndexerConfig;
use super::registry::IndexerRegistry;

/// Queue admission class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// Background work, appended to the tail
    Bulk,
    /// On-demand re-index, inserted at the head
    Single,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bulk => "bulk",
            Self::Single => "single",
        })
    }
}

/// Either one value or a list of them, preserving which form was received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Self::Many(items) => items.iter(),
            Self::One(item) => std::slice::from_ref(item).iter(),
        }
    }

    /// Map every element, keeping the one/many shape
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::Many(items) => OneOrMany::Many(items.into_iter().map(f).collect()),
            Self::One(item) => OneOrMany::One(f(item)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Many(items) => items.len(),
            Self::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One data point to extract from the job's URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexTarget {
    /// Opaque identifier of the stored datum, echoed in the response
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    /// Head of the indexer chain
    pub indexer: IndexerConfig,
    /// Chain members referenced by `nextIndexerId`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexers: Vec<IndexerConfig>,
}

impl IndexTarget {
    pub fn new(indexer: IndexerConfig) -> Self {
        Self {
            id: Value::Null,
            indexer,
            indexers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_chain(mut self, indexers: Vec<IndexerConfig>) -> Self {
        self.indexers = indexers;
        self
    }

    /// Registry over the head and every chain member
    #[must_use]
    pub fn registry(&self) -> IndexerRegistry {
        IndexerRegistry::from_configs(std::iter::once(&self.indexer).chain(self.indexers.iter()))
    }
}

/// Extracted value for one `IndexTarget`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedValue {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    /// `None` only when nothing matched and the indexer keeps the old value
    pub value: Option<String>,
    #[serde(default)]
    pub keep_old_value: bool,
}

pub type DataToIndex = OneOrMany<IndexTarget>;
pub type IndexResponse = OneOrMany<IndexedValue>;

/// One request to extract data for a URL
///
/// Fields the worker does not interpret are kept in `extra` and echoed back
/// with the result so the coordinator can correlate replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub url: String,
    pub data_to_index: DataToIndex,
    pub queue: Lane,
    #[serde(default)]
    pub notify: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn new(url: impl Into<String>, data_to_index: DataToIndex, queue: Lane) -> Self {
        Self {
            url: url.into(),
            data_to_index,
            queue,
            notify: Vec::new(),
            extra: Map::new(),
        }
    }

    /// On-demand re-index of one target, as submitted by the web application
    pub fn single(url: impl Into<String>, target: IndexTarget, notify: Vec<Value>) -> Self {
        Self {
            notify,
            ..Self::new(url, OneOrMany::One(target), Lane::Single)
        }
    }

    /// Same job moved to another lane
    #[must_use]
    pub fn in_lane(mut self, lane: Lane) -> Self {
        self.queue = lane;
        self
    }

    /// Job fields echoed in result messages (everything but `dataToIndex`)
    #[must_use]
    pub fn echo_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert("url".into(), Value::String(self.url.clone()));
        fields.insert("queue".into(), Value::String(self.queue.to_string()));
        fields.insert("notify".into(), Value::Array(self.notify.clone()));
        fields
    }
}
