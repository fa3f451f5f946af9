//! Two-lane job queue
//!
//! Bulk jobs join the tail, single jobs jump to the head. The queue itself
//! is a plain deque behind a mutex; a `Notify` wakes the worker when work
//! arrives. Handles are cheap clones sharing the same deque.

use log::{debug, info};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use crate::indexer::{IndexTarget, Job, Lane};

struct QueueInner {
    jobs: Mutex<VecDeque<Job>>,
    notify: Notify,
    closed: AtomicBool,
}

/// Shared handle to the job queue
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("pending", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                jobs: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Enqueue according to the job's own lane
    pub fn submit(&self, job: Job) {
        if self.is_closed() {
            debug!("Queue closed, dropping job for {}", job.url);
            return;
        }

        {
            let mut jobs = self.inner.jobs.lock();
            match job.queue {
                Lane::Bulk => jobs.push_back(job),
                Lane::Single => jobs.push_front(job),
            }
        }
        self.inner.notify.notify_one();
    }

    /// Enqueue in `lane`, overriding the job's own lane
    pub fn submit_to(&self, job: Job, lane: Lane) {
        self.submit(job.in_lane(lane));
    }

    /// On-demand re-index of one target; always takes the single lane
    pub fn reindex(&self, url: impl Into<String>, target: IndexTarget, notify: Vec<Value>) {
        let job = Job::single(url, target, notify);
        info!("Re-index requested for {}", job.url);
        self.submit(job);
    }

    /// Resubmit `job` to the bulk lane once `delay` has passed
    ///
    /// The wait happens on its own task so the worker is free meanwhile.
    pub fn defer(&self, job: Job, delay: Duration) {
        debug!("Deferring {} for {} ms", job.url, delay.as_millis());
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.submit_to(job, Lane::Bulk);
        });
    }

    /// Take the next job without waiting
    #[must_use]
    pub fn try_pop(&self) -> Option<Job> {
        self.inner.jobs.lock().pop_front()
    }

    /// Wait for the next job; `None` once the queue is closed and drained
    pub async fn pop(&self) -> Option<Job> {
        loop {
            if let Some(job) = self.try_pop() {
                return Some(job);
            }
            if self.is_closed() {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// Stop accepting jobs and wake the worker so it can exit
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.jobs.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.jobs.lock().is_empty()
    }

    /// URLs of pending jobs in dequeue order
    #[must_use]
    pub fn pending_urls(&self) -> Vec<String> {
        self.inner.jobs.lock().iter().map(|job| job.url.clone()).collect()
    }
}
