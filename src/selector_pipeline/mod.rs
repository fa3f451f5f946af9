//! Text post-processing for extracted values
//!
//! The pipeline is a pure function of the raw text, the indexer config and
//! the post-processor table. Stages run in a fixed order:
//!
//! 1. literal replacements, in listed order
//! 2. `slice` (JavaScript `slice` semantics over characters)
//! 3. `decodeUrl`
//! 4. named `postProcessor`
//! 5. whitespace trim
//! 6. `decimalPlaces` rounding, when the value is numeric

pub mod post_processors;
pub mod transforms;

pub use post_processors::{PostProcessor, PostProcessorRegistry};
pub use transforms::{SliceRange, apply_replacements, decode_url, round_decimal};

use log::warn;

use crate::indexer::IndexerConfig;

/// Selector pipeline bound to a post-processor table
#[derive(Debug, Clone, Default)]
pub struct SelectorPipeline {
    post_processors: PostProcessorRegistry,
}

impl SelectorPipeline {
    #[must_use]
    pub fn new(post_processors: PostProcessorRegistry) -> Self {
        Self { post_processors }
    }

    #[must_use]
    pub fn post_processors(&self) -> &PostProcessorRegistry {
        &self.post_processors
    }

    /// Transform raw extracted text according to `config`
    #[must_use]
    pub fn apply(&self, raw: &str, config: &IndexerConfig) -> String {
        let mut text = apply_replacements(raw, &config.replacements);

        if let Some(spec) = config.slice.as_deref().filter(|s| !s.trim().is_empty()) {
            match SliceRange::parse(spec) {
                Some(range) => text = range.apply(&text),
                None => warn!("Ignoring invalid slice '{spec}' on indexer {}", config.label()),
            }
        }

        if config.decode_url {
            text = decode_url(&text);
        }

        if let Some(name) = config.post_processor.as_deref().filter(|s| !s.is_empty()) {
            match self.post_processors.get(name) {
                Some(processor) => text = (**processor)(&text),
                None => warn!("Unknown post processor '{name}' on indexer {}", config.label()),
            }
        }

        let text = text.trim();

        match config.decimal_places {
            Some(places) => round_decimal(text, places),
            None => text.to_string(),
        }
    }
}

/// Apply the pipeline with the built-in post-processors
#[must_use]
pub fn apply(raw: &str, config: &IndexerConfig) -> String {
    SelectorPipeline::default().apply(raw, config)
}
