//! The page surface the extractor drives
//!
//! `IndexerPage` is the only thing extraction needs from a browser. The
//! Chromium implementation lives in `chromium_page`; tests drive the same
//! code through an in-memory page.

use anyhow::Result;
use async_trait::async_trait;

/// How a selector expression is evaluated against the DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Css,
    Xpath,
}

/// One open browser page inside an isolated context
#[async_trait]
pub trait IndexerPage: Send + Sync {
    /// Navigate and wait for the document to load
    async fn goto(&self, url: &str) -> Result<()>;

    /// URL of the loaded document, if any
    async fn current_url(&self) -> Result<Option<String>>;

    /// Click the first element matching a CSS selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Text of the first node matching `selector`, `None` when nothing matches
    ///
    /// CSS selectors may end in `@attribute` to read an attribute instead of
    /// text. `<meta>` elements yield their `content` attribute.
    async fn query(&self, kind: QueryKind, selector: &str) -> Result<Option<String>>;

    /// Raw text of every element matching a CSS selector, in document order
    async fn json_documents(&self, selector: &str) -> Result<Vec<String>>;

    /// Visible text of the whole document
    async fn text(&self) -> Result<String>;

    /// Replace the document with an HTML fragment
    async fn set_content(&self, html: &str) -> Result<()>;
}
