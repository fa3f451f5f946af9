//! `IndexerPage` over a chromiumoxide `Page`

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::Page;
use log::{debug, warn};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use super::js_scripts::{
    PAGE_TEXT_SCRIPT, READY_STATE_SCRIPT, css_query_script, json_documents_script,
    xpath_query_script,
};
use super::page::{IndexerPage, QueryKind};
use crate::indexer_engine::page_timeout::with_page_timeout;

/// Per-page timeouts
#[derive(Debug, Clone, Copy)]
pub struct PageTimeouts {
    /// Bound on `goto` until the navigation commits
    pub navigation: Duration,
    /// Bound on waiting for `document.readyState === 'complete'`
    pub page_load: Duration,
    /// Bound on a single script evaluation
    pub evaluate: Duration,
}

impl Default for PageTimeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            page_load: Duration::from_secs(30),
            evaluate: Duration::from_secs(10),
        }
    }
}

/// A Chromium page owned by one job context
#[derive(Debug, Clone)]
pub struct ChromiumPage {
    page: Page,
    timeouts: PageTimeouts,
}

impl ChromiumPage {
    #[must_use]
    pub fn new(page: Page, timeouts: PageTimeouts) -> Self {
        Self { page, timeouts }
    }

    #[must_use]
    pub fn inner(&self) -> &Page {
        &self.page
    }

    /// Close the underlying CDP target
    pub async fn close(&self) -> Result<()> {
        self.page
            .clone()
            .close()
            .await
            .context("Failed to close page")
    }

    async fn evaluate(&self, script: String, operation: &str) -> Result<Value> {
        let result = with_page_timeout(
            async {
                self.page
                    .evaluate(script)
                    .await
                    .with_context(|| format!("{operation} evaluation failed"))
            },
            self.timeouts.evaluate,
            operation,
        )
        .await?;

        result
            .into_value::<Value>()
            .map_err(|e| anyhow!("{operation} returned an unreadable value: {e}"))
    }

    /// Poll until the document reports `complete`
    ///
    /// Best effort: slow pages are logged and extraction proceeds, since
    /// selector polling gives late content another chance.
    async fn wait_for_page_load(&self) {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(100);

        loop {
            if start.elapsed() >= self.timeouts.page_load {
                warn!(
                    "Timeout waiting for page load after {}s, proceeding anyway",
                    self.timeouts.page_load.as_secs()
                );
                return;
            }

            if let Ok(value) = self.evaluate(READY_STATE_SCRIPT.to_string(), "Ready state").await {
                let ready_state = value.get("readyState").and_then(Value::as_str);
                let body_exists = value.get("bodyExists").and_then(Value::as_bool).unwrap_or(false);
                if ready_state == Some("complete") && body_exists {
                    debug!("Page ready after {:.2}s", start.elapsed().as_secs_f64());
                    return;
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Unpack `{ error }` / `{ found, value }` replies from the query scripts
fn query_value(reply: &Value, selector: &str) -> Result<Option<String>> {
    if let Some(error) = reply.get("error").and_then(Value::as_str) {
        return Err(anyhow!("Invalid selector '{selector}': {error}"));
    }
    Ok(reply
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_string))
}

#[async_trait]
impl IndexerPage for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        with_page_timeout(
            async {
                self.page
                    .goto(url)
                    .await
                    .with_context(|| format!("Failed to navigate to {url}"))?;
                Ok(())
            },
            self.timeouts.navigation,
            "Navigation",
        )
        .await?;

        self.wait_for_page_load().await;
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>> {
        self.page.url().await.context("Failed to read page URL")
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("No element matches '{selector}'"))?;
        element
            .click()
            .await
            .with_context(|| format!("Failed to click '{selector}'"))?;

        // A click may trigger navigation or client-side rendering
        self.wait_for_page_load().await;
        Ok(())
    }

    async fn query(&self, kind: QueryKind, selector: &str) -> Result<Option<String>> {
        let script = match kind {
            QueryKind::Css => css_query_script(selector),
            QueryKind::Xpath => xpath_query_script(selector),
        };
        let reply = self.evaluate(script, "Selector query").await?;
        query_value(&reply, selector)
    }

    async fn json_documents(&self, selector: &str) -> Result<Vec<String>> {
        let reply = self
            .evaluate(json_documents_script(selector), "JSON document query")
            .await?;
        if let Some(error) = reply.get("error").and_then(Value::as_str) {
            return Err(anyhow!("Invalid selector '{selector}': {error}"));
        }
        Ok(reply
            .get("documents")
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn text(&self) -> Result<String> {
        let reply = self
            .evaluate(PAGE_TEXT_SCRIPT.to_string(), "Page text")
            .await?;
        Ok(reply
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn set_content(&self, html: &str) -> Result<()> {
        with_page_timeout(
            async {
                self.page
                    .set_content(html)
                    .await
                    .context("Failed to load HTML fragment")?;
                Ok(())
            },
            self.timeouts.navigation,
            "Set content",
        )
        .await
    }
}
