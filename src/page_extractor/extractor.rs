//! Job extraction over an `IndexerPage`
//!
//! For each target the head indexer reads the job URL; every following
//! link in the chain consumes the previous link's post-processed output:
//!
//! - `JSON` parses it and looks up its selectors
//! - `TEXT` passes it through
//! - `CSS` / `XPATH` navigate when it is a link, otherwise load it as an
//!   HTML fragment, then query the resulting document
//!
//! Selectors are tried in listed order and the first non-empty match wins.
//! Page sources are polled until `selector_timeout` so late-rendered
//! content still matches.

use log::{debug, info};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use super::json_path;
use super::page::{IndexerPage, QueryKind};
use crate::indexer::{IndexResponse, IndexTarget, IndexType, IndexedValue, IndexerConfig, Job, OneOrMany};
use crate::indexer_engine::IndexerError;
use crate::selector_pipeline::SelectorPipeline;
use crate::utils::{DEFAULT_MAX_CHAIN_DEPTH, JSON_LD_SELECTOR, apply_search_params, resolve_link};

/// Extraction limits
#[derive(Debug, Clone, Copy)]
pub struct ExtractorSettings {
    pub max_chain_depth: usize,
    /// How long selectors are retried against a page before giving up
    pub selector_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            selector_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Runs indexer chains against a page
#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    pipeline: SelectorPipeline,
    settings: ExtractorSettings,
}

impl PageExtractor {
    #[must_use]
    pub fn new(pipeline: SelectorPipeline, settings: ExtractorSettings) -> Self {
        Self { pipeline, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Extract every target of `job`
    ///
    /// The response keeps the shape of `dataToIndex`: one target yields one
    /// value, a list yields a list in the same order. Any failing target
    /// fails the job.
    pub async fn extract_job(
        &self,
        page: &dyn IndexerPage,
        job: &Job,
    ) -> Result<IndexResponse, IndexerError> {
        // URL currently loaded and untouched by clicks or chain hops
        let mut loaded: Option<String> = None;

        let mut values = Vec::with_capacity(job.data_to_index.len());
        for target in job.data_to_index.iter() {
            values.push(self.extract_target(page, &job.url, target, &mut loaded).await?);
        }

        match job.data_to_index {
            OneOrMany::One(_) => values
                .pop()
                .map(OneOrMany::One)
                .ok_or_else(|| IndexerError::Extraction("Job has no data to index".to_string())),
            OneOrMany::Many(_) => Ok(OneOrMany::Many(values)),
        }
    }

    /// Extract one target, following its indexer chain
    pub async fn extract_target(
        &self,
        page: &dyn IndexerPage,
        job_url: &str,
        target: &IndexTarget,
        loaded: &mut Option<String>,
    ) -> Result<IndexedValue, IndexerError> {
        let registry = target.registry();
        let chain = registry.resolve_chain(&target.indexer, self.settings.max_chain_depth)?;
        let head = &target.indexer;

        let entry_url = match &head.search_params {
            Some(params) => apply_search_params(job_url, params).map_err(IndexerError::extraction)?,
            None => job_url.to_string(),
        };

        if loaded.as_deref() != Some(entry_url.as_str()) {
            self.navigate(page, &entry_url).await?;
        }
        *loaded = Some(entry_url);

        let mut current: Option<String> = None;
        for (depth, link) in chain.iter().enumerate() {
            let raw = match current.take() {
                None => self.read_page(page, link).await?,
                Some(previous) => self.read_from_value(page, link, previous).await?,
            };

            if link.selector_to_click.is_some() || needs_document(link, depth) {
                *loaded = None;
            }

            let Some(raw) = raw else {
                return unmatched(target, link);
            };

            let processed = self.pipeline.apply(&raw, link);
            debug!(
                "Indexer {} (link {}/{}) produced {} chars",
                link.label(),
                depth + 1,
                chain.len(),
                processed.len()
            );
            current = Some(processed);
        }

        Ok(IndexedValue {
            id: target.id.clone(),
            value: current,
            keep_old_value: head.keep_old_value,
        })
    }

    async fn navigate(&self, page: &dyn IndexerPage, url: &str) -> Result<(), IndexerError> {
        info!("Navigating to {url}");
        page.goto(url).await.map_err(|e| IndexerError::Navigation {
            url: url.to_string(),
            message: format!("{e:#}"),
        })
    }

    /// Read `link` from the loaded document, clicking first if configured
    async fn read_page(
        &self,
        page: &dyn IndexerPage,
        link: &IndexerConfig,
    ) -> Result<Option<String>, IndexerError> {
        if let Some(selector) = link.selector_to_click.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            debug!("Clicking '{selector}' before reading {}", link.label());
            page.click(selector).await.map_err(|e| IndexerError::Click {
                selector: selector.to_string(),
                message: format!("{e:#}"),
            })?;
        }

        if link.index_type == IndexType::Text {
            let text = page.text().await.map_err(IndexerError::extraction)?;
            return Ok(non_empty(text));
        }

        let selectors = link.selector_list();
        if selectors.is_empty() {
            return Err(IndexerError::NoSelectors { indexer: link.label() });
        }

        let deadline = Instant::now() + self.settings.selector_timeout;
        loop {
            if let Some(value) = self.read_page_once(page, link.index_type, &selectors).await? {
                return Ok(Some(value));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn read_page_once(
        &self,
        page: &dyn IndexerPage,
        index_type: IndexType,
        selectors: &[&str],
    ) -> Result<Option<String>, IndexerError> {
        let kind = match index_type {
            IndexType::Css => QueryKind::Css,
            IndexType::Xpath => QueryKind::Xpath,
            IndexType::Json => {
                let documents = page
                    .json_documents(JSON_LD_SELECTOR)
                    .await
                    .map_err(IndexerError::extraction)?;
                let parsed: Vec<Value> = documents
                    .iter()
                    .filter_map(|doc| match serde_json::from_str(doc) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            debug!("Skipping unparsable JSON-LD block: {e}");
                            None
                        }
                    })
                    .collect();
                return Ok(json_path::first_match(&parsed, selectors));
            }
            IndexType::Text => return page.text().await.map(non_empty).map_err(IndexerError::extraction),
        };

        for selector in selectors {
            let value = page.query(kind, selector).await.map_err(IndexerError::extraction)?;
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Read `link` with the previous link's output as its source
    async fn read_from_value(
        &self,
        page: &dyn IndexerPage,
        link: &IndexerConfig,
        previous: String,
    ) -> Result<Option<String>, IndexerError> {
        match link.index_type {
            IndexType::Text => Ok(non_empty(previous)),
            IndexType::Json => {
                let selectors = link.selector_list();
                if selectors.is_empty() {
                    return Err(IndexerError::NoSelectors { indexer: link.label() });
                }
                let document: Value = serde_json::from_str(&previous).map_err(|e| {
                    IndexerError::Extraction(format!(
                        "Indexer {} expected JSON from the previous indexer: {e}",
                        link.label()
                    ))
                })?;
                Ok(json_path::first_match(std::slice::from_ref(&document), &selectors))
            }
            IndexType::Css | IndexType::Xpath => {
                let base = page.current_url().await.ok().flatten();
                match resolve_link(&previous, base.as_deref()) {
                    Some(next) => {
                        let next = match &link.search_params {
                            Some(params) => {
                                apply_search_params(&next, params).map_err(IndexerError::extraction)?
                            }
                            None => next,
                        };
                        self.navigate(page, &next).await?;
                    }
                    None => page
                        .set_content(&previous)
                        .await
                        .map_err(IndexerError::extraction)?,
                }
                self.read_page(page, link).await
            }
        }
    }
}

/// Whether this link replaces the loaded document
fn needs_document(link: &IndexerConfig, depth: usize) -> bool {
    depth > 0 && matches!(link.index_type, IndexType::Css | IndexType::Xpath)
}

fn non_empty(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

/// Nothing matched `link`: keep the stored value or fail
fn unmatched(target: &IndexTarget, link: &IndexerConfig) -> Result<IndexedValue, IndexerError> {
    if target.indexer.keep_old_value || link.keep_old_value {
        info!("No match for {}, keeping previous value", link.label());
        return Ok(IndexedValue {
            id: target.id.clone(),
            value: None,
            keep_old_value: true,
        });
    }
    Err(IndexerError::NothingMatched { indexer: link.label() })
}
