//! Isolated browser contexts per job
//!
//! Every job runs in a fresh context (separate cookies, storage and cache)
//! with one page. `with_job_context` is the only way jobs acquire one: it
//! closes the context on success, error, timeout and panic alike.

pub mod chromium;
pub mod options;

pub use chromium::{BrowserSession, SessionSettings};
pub use options::ContextOptions;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, warn};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use crate::indexer_engine::IndexerError;
use crate::indexer_engine::page_timeout::with_job_timeout;
use crate::page_extractor::IndexerPage;

/// Source of isolated browser contexts
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Open a fresh context with one page, configured from `options`
    async fn open_context(&self, options: &ContextOptions) -> Result<Box<dyn JobContext>>;
}

/// One isolated context and its page
#[async_trait]
pub trait JobContext: Send {
    fn page(&self) -> Arc<dyn IndexerPage>;

    /// Close the page and discard the context's state
    async fn close(self: Box<Self>) -> Result<()>;
}

#[async_trait]
impl<P: ContextProvider + ?Sized> ContextProvider for Arc<P> {
    async fn open_context(&self, options: &ContextOptions) -> Result<Box<dyn JobContext>> {
        (**self).open_context(options).await
    }
}

/// Run `job` against a fresh context, closing it on every exit path
///
/// `timeout` bounds the whole job; on expiry the job future is dropped and
/// the context is still closed. A panic inside the job is caught and
/// reported as an error for this job only.
pub async fn with_job_context<P, F, Fut, T>(
    provider: &P,
    options: &ContextOptions,
    timeout: Duration,
    job: F,
) -> Result<T, IndexerError>
where
    P: ContextProvider + ?Sized,
    F: FnOnce(Arc<dyn IndexerPage>) -> Fut,
    Fut: Future<Output = Result<T, IndexerError>>,
{
    let context = provider
        .open_context(options)
        .await
        .map_err(|e| IndexerError::ContextCreation(format!("{e:#}")))?;

    let outcome = AssertUnwindSafe(with_job_timeout(job(context.page()), timeout))
        .catch_unwind()
        .await;

    if let Err(e) = context.close().await {
        warn!("Failed to close browser context for {}: {e:#}", options.url);
    } else {
        debug!("Closed browser context for {}", options.url);
    }

    match outcome {
        Ok(result) => result,
        Err(panic) => Err(IndexerError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic during job".to_string())
}
