//! Named post-processing functions
//!
//! Indexers refer to post-processors by name. The table is injected into the
//! pipeline so deployments can register their own transforms without
//! touching extraction code.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A named text transform
pub type PostProcessor = Arc<dyn Fn(&str) -> String + Send + Sync>;

static NON_DIGIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\D+").expect("Invalid non-digit regex"));
static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("Invalid number regex"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Lookup table from post-processor name to transform
#[derive(Clone)]
pub struct PostProcessorRegistry {
    processors: HashMap<String, PostProcessor>,
}

impl fmt::Debug for PostProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.processors.keys().collect();
        names.sort();
        f.debug_struct("PostProcessorRegistry")
            .field("processors", &names)
            .finish()
    }
}

impl PostProcessorRegistry {
    /// Registry with no entries
    #[must_use]
    pub fn empty() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in transforms
    ///
    /// - `trim`: strip surrounding whitespace
    /// - `lowercase` / `uppercase`
    /// - `digits`: keep only ASCII digits
    /// - `number`: first number in the text, thousands separators removed
    /// - `collapseWhitespace`: runs of whitespace become one space
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("trim", |s| s.trim().to_string());
        registry.register("lowercase", str::to_lowercase);
        registry.register("uppercase", str::to_uppercase);
        registry.register("digits", |s| NON_DIGIT.replace_all(s, "").into_owned());
        registry.register("number", |s| {
            FIRST_NUMBER
                .find(s)
                .map(|m| m.as_str().replace(',', ""))
                .unwrap_or_default()
        });
        registry.register("collapseWhitespace", |s| {
            WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
        });
        registry
    }

    /// Register or replace a transform
    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.processors.insert(name.into(), Arc::new(f));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PostProcessor> {
        self.processors.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }
}

impl Default for PostProcessorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
