//! Declarative extraction rules
//!
//! An `IndexerConfig` describes how to read one data point from one site:
//! which selectors to evaluate, how to post-process the text, and which
//! indexer (if any) consumes the result next.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Extraction strategy for an indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexType {
    /// CSS selectors evaluated against the DOM
    #[default]
    Css,
    /// XPath expressions evaluated against the DOM
    Xpath,
    /// Dotted paths looked up in JSON (ld+json scripts, or the previous link's output)
    Json,
    /// Raw page text, no selector evaluation
    Text,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Css => "CSS",
            Self::Xpath => "XPATH",
            Self::Json => "JSON",
            Self::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Identifier of an indexer
///
/// The coordinator sends ids as numbers, the edit forms as strings. Both
/// normalise to the same textual key so `nextIndexerId: 7` and
/// `nextIndexerId: "7"` resolve to the same config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexerId(String);

impl IndexerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for IndexerId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for IndexerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for IndexerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for IndexerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Self(n.to_string())),
            Raw::Float(f) if f.fract() == 0.0 => Ok(Self(format!("{f:.0}"))),
            Raw::Float(f) => Ok(Self(f.to_string())),
            Raw::Str(s) => Ok(Self(s.trim().to_string())),
        }
    }
}

/// One lookup expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub selector: String,
}

impl From<&str> for Selector {
    fn from(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
        }
    }
}

/// Literal substring substitution applied to raw extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl Replacement {
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: Some(replacement.into()),
        }
    }

    /// Replacement that deletes every occurrence of `search`
    pub fn remove(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: None,
        }
    }
}

/// Extraction rule for one data point
///
/// Field names follow the coordinator's camelCase wire format. Targeting
/// metadata (`name`, `hostname`, `path_extension`) is carried for logging
/// only; the caller has already picked the config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IndexerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_extension: Option<String>,
    #[serde(default)]
    pub index_type: IndexType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selectors: Vec<Selector>,
    /// Legacy single selector, used when `selectors` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub replacements: Vec<Replacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_processor: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decode_url: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keep_old_value: bool,
    /// Coordinator scheduling hint; the worker's revisit gate ignores it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds_between_updates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector_to_click: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_params: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_indexer_id: Option<IndexerId>,
    /// Inline form of `next_indexer_id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_indexer: Option<Box<IndexerConfig>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl IndexerConfig {
    /// Create a config with a single selector of the given type
    pub fn new(index_type: IndexType, selector: impl Into<String>) -> Self {
        Self {
            index_type,
            selectors: vec![Selector {
                selector: selector.into(),
            }],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<IndexerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_next(mut self, next: impl Into<IndexerId>) -> Self {
        self.next_indexer_id = Some(next.into());
        self
    }

    #[must_use]
    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacements.push(replacement);
        self
    }

    #[must_use]
    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    /// Selector expressions in evaluation order
    ///
    /// `selectors` wins when non-empty; otherwise the legacy `selector`
    /// field is used. Blank entries are skipped.
    pub fn selector_list(&self) -> Vec<&str> {
        let listed: Vec<&str> = self
            .selectors
            .iter()
            .map(|s| s.selector.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if !listed.is_empty() {
            return listed;
        }

        self.selector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect()
    }

    /// Short label for logs: `name@hostname` or the id
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.id, self.name.is_empty()) {
            (_, false) if !self.hostname.is_empty() => format!("{}@{}", self.name, self.hostname),
            (_, false) => self.name.clone(),
            (Some(id), true) => format!("#{id}"),
            (None, true) => format!("<{}>", self.index_type),
        }
    }
}
