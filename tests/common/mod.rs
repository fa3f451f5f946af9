//! Test utilities: an in-memory browser for driving the worker without Chromium

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use indexer_worker::browser_session::{ContextOptions, ContextProvider, JobContext};
use indexer_worker::page_extractor::{IndexerPage, QueryKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One document served by the fake site
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    pub css: HashMap<String, String>,
    pub xpath: HashMap<String, String>,
    pub json_ld: Vec<String>,
    pub text: String,
    /// Cookie the "server" sets when this URL is loaded
    pub sets_cookie: Option<(String, String)>,
    /// `text()` reports the context's cookie jar instead of `text`
    pub echo_cookies: bool,
    /// Document shown after clicking a selector
    pub on_click: HashMap<String, FakeDocument>,
    /// CSS selector whose value only appears after this many queries
    pub late: Option<(String, String, usize)>,
    pub panic_on_query: bool,
    pub hang_on_goto: bool,
}

#[allow(dead_code)]
impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn css(mut self, selector: &str, value: &str) -> Self {
        self.css.insert(selector.to_string(), value.to_string());
        self
    }

    pub fn xpath(mut self, expression: &str, value: &str) -> Self {
        self.xpath.insert(expression.to_string(), value.to_string());
        self
    }

    pub fn json_ld(mut self, document: &str) -> Self {
        self.json_ld.push(document.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn sets_cookie(mut self, name: &str, value: &str) -> Self {
        self.sets_cookie = Some((name.to_string(), value.to_string()));
        self
    }

    pub fn echo_cookies(mut self) -> Self {
        self.echo_cookies = true;
        self
    }

    pub fn on_click(mut self, selector: &str, document: FakeDocument) -> Self {
        self.on_click.insert(selector.to_string(), document);
        self
    }

    pub fn late(mut self, selector: &str, value: &str, after_queries: usize) -> Self {
        self.late = Some((selector.to_string(), value.to_string(), after_queries));
        self
    }

    pub fn panics(mut self) -> Self {
        self.panic_on_query = true;
        self
    }

    pub fn hangs(mut self) -> Self {
        self.hang_on_goto = true;
        self
    }
}

#[derive(Default)]
struct FakeBrowserState {
    pages: Mutex<HashMap<String, FakeDocument>>,
    fragments: Mutex<HashMap<String, FakeDocument>>,
    navigations: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// In-memory `ContextProvider` recording context lifecycles and navigations
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<FakeBrowserState>,
}

#[allow(dead_code)]
impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, document: FakeDocument) -> Self {
        self.state.pages.lock().unwrap().insert(url.to_string(), document);
        self
    }

    /// Document produced by `set_content(html)`
    pub fn fragment(self, html: &str, document: FakeDocument) -> Self {
        self.state.fragments.lock().unwrap().insert(html.to_string(), document);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextProvider for FakeBrowser {
    async fn open_context(&self, options: &ContextOptions) -> Result<Box<dyn JobContext>> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeContext {
            browser: self.state.clone(),
            page: Arc::new(FakePage {
                browser: self.state.clone(),
                jar: Mutex::new(options.cookies.clone()),
                current: Mutex::new(None),
                queries: AtomicUsize::new(0),
            }),
        }))
    }
}

struct FakeContext {
    browser: Arc<FakeBrowserState>,
    page: Arc<FakePage>,
}

#[async_trait]
impl JobContext for FakeContext {
    fn page(&self) -> Arc<dyn IndexerPage> {
        self.page.clone()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.browser.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Page inside one fake context; the cookie jar dies with the context
pub struct FakePage {
    browser: Arc<FakeBrowserState>,
    jar: Mutex<Vec<(String, String)>>,
    current: Mutex<Option<(String, FakeDocument)>>,
    queries: AtomicUsize,
}

impl FakePage {
    fn document(&self) -> Result<FakeDocument> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| anyhow!("no document loaded"))
    }
}

#[async_trait]
impl IndexerPage for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.browser.navigations.lock().unwrap().push(url.to_string());
        let document = self
            .browser
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("net::ERR_NAME_NOT_RESOLVED at {url}"))?;

        if document.hang_on_goto {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(cookie) = &document.sets_cookie {
            self.jar.lock().unwrap().push(cookie.clone());
        }
        self.queries.store(0, Ordering::SeqCst);
        *self.current.lock().unwrap() = Some((url.to_string(), document));
        Ok(())
    }

    async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.current.lock().unwrap().as_ref().map(|(url, _)| url.clone()))
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let document = self.document()?;
        let next = document
            .on_click
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("No element matches '{selector}'"))?;
        let mut current = self.current.lock().unwrap();
        let url = current.as_ref().map(|(url, _)| url.clone()).unwrap_or_default();
        *current = Some((url, next));
        Ok(())
    }

    async fn query(&self, kind: QueryKind, selector: &str) -> Result<Option<String>> {
        let document = self.document()?;
        if document.panic_on_query {
            panic!("renderer crashed while reading {selector}");
        }
        let seen = self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some((late_selector, value, after)) = &document.late
            && late_selector == selector
            && kind == QueryKind::Css
        {
            return Ok((seen >= *after).then(|| value.clone()));
        }
        Ok(match kind {
            QueryKind::Css => document.css.get(selector).cloned(),
            QueryKind::Xpath => document.xpath.get(selector).cloned(),
        })
    }

    async fn json_documents(&self, _selector: &str) -> Result<Vec<String>> {
        Ok(self.document()?.json_ld)
    }

    async fn text(&self) -> Result<String> {
        let document = self.document()?;
        if document.echo_cookies {
            let jar = self.jar.lock().unwrap();
            let rendered: Vec<String> = jar.iter().map(|(k, v)| format!("{k}={v}")).collect();
            return Ok(format!("cookies=[{}]", rendered.join("; ")));
        }
        Ok(document.text)
    }

    async fn set_content(&self, html: &str) -> Result<()> {
        let document = self
            .browser
            .fragments
            .lock()
            .unwrap()
            .get(html)
            .cloned()
            .unwrap_or_default();
        *self.current.lock().unwrap() = Some(("about:blank".to_string(), document));
        Ok(())
    }
}
