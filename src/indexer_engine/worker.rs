//! The job worker
//!
//! Pulls one job at a time, gates it on the rate limiter, runs extraction in
//! a fresh browser context and publishes the outcome. Deferred jobs go back
//! to the queue on a timer and are never reported; terminal results go to
//! the completion channel. Nothing a job does stops the loop.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::job_queue::JobQueue;
use super::job_result::JobResult;
use super::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::browser_session::{ContextOptions, ContextProvider, with_job_context};
use crate::indexer::Job;
use crate::page_extractor::PageExtractor;

/// Sink for terminal results
pub type CompletionSender = mpsc::UnboundedSender<JobResult>;

/// Single-consumer worker over a `JobQueue`
pub struct JobWorker<P: ContextProvider + ?Sized> {
    queue: JobQueue,
    rate_limiter: Arc<RateLimiter>,
    provider: Arc<P>,
    extractor: PageExtractor,
    completions: CompletionSender,
    job_timeout: Duration,
}

impl<P: ContextProvider + ?Sized> JobWorker<P> {
    pub fn new(
        queue: JobQueue,
        rate_limiter: Arc<RateLimiter>,
        provider: Arc<P>,
        extractor: PageExtractor,
        completions: CompletionSender,
        job_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            rate_limiter,
            provider,
            extractor,
            completions,
            job_timeout,
        }
    }

    /// Process jobs until the queue is closed
    pub async fn run(self) {
        info!("Job worker started");
        while let Some(job) = self.queue.pop().await {
            let result = self.process(job).await;
            self.dispatch(result);
        }
        info!("Job worker stopped");
    }

    /// Run one job to a `JobResult` without publishing it
    pub async fn process(&self, job: Job) -> JobResult {
        if let RateLimitDecision::Deny { retry_after } = self.rate_limiter.check_and_mark(&job.url) {
            return JobResult::RetryDeferred {
                job,
                retry_in: retry_after,
            };
        }

        info!("Indexing {} ({} lane)", job.url, job.queue);
        let options = ContextOptions::for_job(&job);
        let extractor = &self.extractor;
        let job_ref = &job;
        let outcome = with_job_context(&*self.provider, &options, self.job_timeout, |page| async move {
            extractor.extract_job(&*page, job_ref).await
        })
        .await;

        match outcome {
            Ok(response) => JobResult::Success { job, response },
            Err(error) => {
                warn!("Indexing {} failed: {error}", job.url);
                JobResult::Failure { job, error }
            }
        }
    }

    /// Route a result: deferrals back to the queue, the rest upstream
    pub fn dispatch(&self, result: JobResult) {
        match result {
            JobResult::RetryDeferred { job, retry_in } => {
                debug!("{} indexed recently, retrying in {} ms", job.url, retry_in.as_millis());
                self.queue.defer(job, retry_in);
            }
            terminal => {
                if self.completions.send(terminal).is_err() {
                    error!("Completion channel closed; dropping result");
                }
            }
        }
    }
}
