//! Chromium-backed context provider
//!
//! One browser process serves the whole worker. Each job gets its own
//! browser context (Chromium's incognito profile), which is disposed when
//! the job ends.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use log::{debug, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::{ContextOptions, ContextProvider, JobContext};
use crate::browser_setup::{LaunchOptions, launch_browser};
use crate::kromekover::{self, StealthProfile};
use crate::page_extractor::{ChromiumPage, IndexerPage, PageTimeouts};

/// Settings for the worker's browser
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub launch: LaunchOptions,
    pub page_timeouts: PageTimeouts,
    /// Skip the evasion scripts (useful against local fixtures)
    pub disable_stealth: bool,
}

/// The worker's browser process
pub struct BrowserSession {
    browser: Arc<Browser>,
    handler: AbortHandle,
    alive: watch::Receiver<bool>,
    user_data_dir: PathBuf,
    settings: SessionSettings,
}

impl std::fmt::Debug for BrowserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserSession")
            .field("alive", &self.is_alive())
            .field("user_data_dir", &self.user_data_dir)
            .finish_non_exhaustive()
    }
}

impl BrowserSession {
    /// Launch the browser and start watching its handler task
    pub async fn launch(settings: SessionSettings) -> Result<Self> {
        let (browser, handler_task, user_data_dir) = launch_browser(&settings.launch).await?;
        let handler = handler_task.abort_handle();

        let (alive_tx, alive) = watch::channel(true);
        tokio::spawn(async move {
            let _ = handler_task.await;
            let _ = alive_tx.send(false);
        });

        Ok(Self {
            browser: Arc::new(browser),
            handler,
            alive,
            user_data_dir,
            settings,
        })
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Resolves once the browser's CDP connection is gone
    pub async fn closed(&self) {
        let mut alive = self.alive.clone();
        // A dropped sender also means the watcher task is gone
        let _ = alive.wait_for(|up| !*up).await;
    }

    /// Close the browser, wait for the process and remove the profile
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            browser,
            handler,
            user_data_dir,
            ..
        } = self;

        match Arc::try_unwrap(browser) {
            Ok(mut browser) => {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {e}");
                }
                if let Err(e) = browser.wait().await {
                    warn!("Failed to wait for browser exit: {e}");
                }
            }
            Err(_) => warn!("Browser still shared at shutdown; leaving process to exit with us"),
        }
        handler.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&user_data_dir).await {
            warn!("Failed to clean up {}: {e}", user_data_dir.display());
        }
        info!("Browser session shut down");
        Ok(())
    }

    async fn dispose(browser: &Browser, id: BrowserContextId) -> Result<()> {
        browser
            .execute(DisposeBrowserContextParams::new(id))
            .await
            .context("Failed to dispose browser context")?;
        Ok(())
    }

    async fn prepare_page(&self, page: &ChromiumPage, options: &ContextOptions) -> Result<()> {
        if !self.settings.disable_stealth {
            let profile = StealthProfile::with_random_seed();
            if let Err(e) = kromekover::inject(page.inner(), &profile).await {
                warn!("Stealth injection failed: {e}");
            }
        }

        if !options.cookies.is_empty() {
            let cookies = options
                .cookies
                .iter()
                .map(|(name, value)| {
                    CookieParam::builder()
                        .name(name.clone())
                        .value(value.clone())
                        .url(options.url.clone())
                        .build()
                        .map_err(|e| anyhow!("Invalid cookie '{name}': {e}"))
                })
                .collect::<Result<Vec<_>>>()?;
            page.inner()
                .set_cookies(cookies)
                .await
                .context("Failed to set cookies")?;
        }

        let headers = options.header_strings();
        if !headers.is_empty() {
            page.inner()
                .execute(SetExtraHttpHeadersParams::new(Headers::new(Value::Object(headers))))
                .await
                .context("Failed to set request headers")?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContextProvider for BrowserSession {
    async fn open_context(&self, options: &ContextOptions) -> Result<Box<dyn JobContext>> {
        if !self.is_alive() {
            return Err(anyhow!("Browser is not running"));
        }

        let context_id = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| anyhow!("Invalid target params: {e}"));

        let page = match target {
            Ok(target) => self.browser.new_page(target).await.context("Failed to open page"),
            Err(e) => Err(e),
        };
        let page = match page {
            Ok(page) => ChromiumPage::new(page, self.settings.page_timeouts),
            Err(e) => {
                // No page means nothing else will dispose the context
                if let Err(dispose) = Self::dispose(&self.browser, context_id).await {
                    warn!("{dispose:#}");
                }
                return Err(e);
            }
        };

        let context = ChromiumJobContext {
            browser: Arc::clone(&self.browser),
            context_id,
            page: Arc::new(page),
        };

        if let Err(e) = self.prepare_page(&context.page, options).await {
            if let Err(close) = Box::new(context).close().await {
                warn!("Failed to close browser context for {}: {close:#}", options.url);
            }
            return Err(e);
        }

        debug!("Opened browser context for {}", options.url);
        Ok(Box::new(context))
    }
}

/// Context + page pair handed to one job
struct ChromiumJobContext {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    page: Arc<ChromiumPage>,
}

#[async_trait]
impl JobContext for ChromiumJobContext {
    fn page(&self) -> Arc<dyn IndexerPage> {
        self.page.clone()
    }

    async fn close(self: Box<Self>) -> Result<()> {
        if let Err(e) = self.page.close().await {
            debug!("{e:#}");
        }
        BrowserSession::dispose(&self.browser, self.context_id).await
    }
}
