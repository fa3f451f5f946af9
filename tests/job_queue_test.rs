//! Worker loop tests: lane priority, deferral, isolation and cleanup
//!
//! Time is paused so rate-limit deferrals and job timeouts elapse instantly.
//! The limiter's clock follows tokio's virtual time.

use indexer_worker::indexer::{IndexTarget, IndexType, IndexerConfig, Job, Lane, OneOrMany};
use indexer_worker::indexer_engine::{Clock, IndexerError, JobQueue, JobResult, JobWorker, RateLimiter};
use indexer_worker::page_extractor::{ExtractorSettings, PageExtractor};
use indexer_worker::selector_pipeline::SelectorPipeline;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

mod common;
use common::{FakeBrowser, FakeDocument};

struct Harness {
    queue: JobQueue,
    results: mpsc::UnboundedReceiver<JobResult>,
    worker: JoinHandle<()>,
}

impl Harness {
    async fn next(&mut self) -> JobResult {
        self.results.recv().await.expect("worker dropped the completion channel")
    }

    async fn shutdown(self) {
        self.queue.close();
        self.worker.await.unwrap();
    }
}

fn virtual_clock() -> Clock {
    let start = Instant::now();
    Arc::new(move || i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX))
}

/// Build a worker over `queue`; jobs submitted beforehand are already ordered
fn spawn_worker(browser: &FakeBrowser, queue: JobQueue) -> Harness {
    let (tx, results) = mpsc::unbounded_channel();
    let extractor = PageExtractor::new(
        SelectorPipeline::default(),
        ExtractorSettings {
            selector_timeout: Duration::from_secs(1),
            ..ExtractorSettings::default()
        },
    );
    let worker = JobWorker::new(
        queue.clone(),
        Arc::new(RateLimiter::with_clock(Duration::from_millis(15_000), virtual_clock())),
        Arc::new(browser.clone()),
        extractor,
        tx,
        Duration::from_secs(90),
    );
    Harness {
        queue,
        results,
        worker: tokio::spawn(worker.run()),
    }
}

fn text_job(url: &str, lane: Lane) -> Job {
    Job::new(
        url,
        OneOrMany::One(IndexTarget::new(IndexerConfig::new(IndexType::Text, ""))),
        lane,
    )
}

fn value_of(result: &JobResult) -> Option<String> {
    match result {
        JobResult::Success {
            response: OneOrMany::One(value),
            ..
        } => value.value.clone(),
        other => panic!("expected a single-value success, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_single_lane_jumps_ahead_of_bulk() {
    let browser = FakeBrowser::new()
        .page("https://a.test/", FakeDocument::new().text("A"))
        .page("https://b.test/", FakeDocument::new().text("B"))
        .page("https://c.test/", FakeDocument::new().text("C"));

    let queue = JobQueue::new();
    queue.submit(text_job("https://a.test/", Lane::Bulk));
    queue.submit(text_job("https://b.test/", Lane::Single));
    queue.submit(text_job("https://c.test/", Lane::Bulk));

    let mut harness = spawn_worker(&browser, queue);
    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(value_of(&harness.next().await).unwrap());
    }

    assert_eq!(seen, vec!["B", "A", "C"]);
    assert_eq!(
        browser.navigations(),
        vec!["https://b.test/", "https://a.test/", "https://c.test/"]
    );
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_single_job_waits_for_running_job() {
    let browser = FakeBrowser::new()
        .page("https://a.test/", FakeDocument::new().late(".price", "A", 3))
        .page("https://b.test/", FakeDocument::new().text("B"))
        .page("https://c.test/", FakeDocument::new().text("C"));

    let queue = JobQueue::new();
    queue.submit(Job::new(
        "https://a.test/",
        OneOrMany::One(IndexTarget::new(IndexerConfig::new(IndexType::Css, ".price"))),
        Lane::Bulk,
    ));
    queue.submit(text_job("https://c.test/", Lane::Bulk));

    let mut harness = spawn_worker(&browser, queue);

    // A is loaded and still polling for its late price
    while browser.navigations().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    harness.queue.submit(text_job("https://b.test/", Lane::Single));

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(value_of(&harness.next().await).unwrap());
    }

    assert_eq!(seen, vec!["A", "B", "C"]);
    assert_eq!(
        browser.navigations(),
        vec!["https://a.test/", "https://b.test/", "https://c.test/"]
    );
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recent_url_is_deferred_then_indexed() {
    let url = "https://shop.test/p/1";
    let browser = FakeBrowser::new().page(url, FakeDocument::new().text("42"));
    let started = Instant::now();

    let queue = JobQueue::new();
    queue.submit(text_job(url, Lane::Bulk));
    queue.submit(text_job(url, Lane::Bulk));

    let mut harness = spawn_worker(&browser, queue);

    let first = harness.next().await;
    assert!(first.is_success());

    // The deferral itself is never reported; the next result is the retry
    let second = harness.next().await;
    assert!(second.is_success());
    assert!(started.elapsed() >= Duration::from_millis(15_000));
    assert_eq!(browser.navigations().len(), 2);

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_update_schedule_does_not_change_revisit_interval() {
    let url = "https://shop.test/daily";
    let browser = FakeBrowser::new().page(url, FakeDocument::new().text("1"));
    let started = Instant::now();

    let mut indexer = IndexerConfig::new(IndexType::Text, "");
    indexer.seconds_between_updates = Some(86_400.0);
    let target = IndexTarget::new(indexer);

    let queue = JobQueue::new();
    queue.reindex(url, target.clone(), Vec::new());
    queue.reindex(url, target, Vec::new());

    let mut harness = spawn_worker(&browser, queue);
    assert!(harness.next().await.is_success());
    assert!(harness.next().await.is_success());

    // Gated on the fixed 15 s interval, not the day-long update schedule
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(15_000));
    assert!(elapsed < Duration::from_secs(20));

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_stop_the_loop() {
    let browser = FakeBrowser::new().page("https://ok.test/", FakeDocument::new().text("fine"));

    let queue = JobQueue::new();
    queue.submit(text_job("https://unreachable.test/", Lane::Bulk));
    queue.submit(text_job("https://ok.test/", Lane::Bulk));

    let mut harness = spawn_worker(&browser, queue);

    match harness.next().await {
        JobResult::Failure { job, error } => {
            assert_eq!(job.url, "https://unreachable.test/");
            assert!(matches!(error, IndexerError::Navigation { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(value_of(&harness.next().await).as_deref(), Some("fine"));

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_context_closed_on_every_outcome() {
    let browser = FakeBrowser::new()
        .page("https://ok.test/", FakeDocument::new().text("fine"))
        .page("https://crash.test/", FakeDocument::new().css(".x", "1").panics())
        .page("https://hang.test/", FakeDocument::new().hangs());

    let css_job = |url: &str| {
        Job::new(
            url,
            OneOrMany::One(IndexTarget::new(IndexerConfig::new(IndexType::Css, ".x"))),
            Lane::Bulk,
        )
    };

    let queue = JobQueue::new();
    queue.submit(text_job("https://ok.test/", Lane::Bulk));
    queue.submit(text_job("https://missing.test/", Lane::Bulk));
    queue.submit(css_job("https://crash.test/"));
    queue.submit(css_job("https://hang.test/"));

    let mut harness = spawn_worker(&browser, queue);

    assert!(harness.next().await.is_success());
    assert!(matches!(
        harness.next().await,
        JobResult::Failure {
            error: IndexerError::Navigation { .. },
            ..
        }
    ));
    match harness.next().await {
        JobResult::Failure {
            error: IndexerError::Panicked(message),
            ..
        } => assert!(message.contains("renderer crashed")),
        other => panic!("expected a caught panic, got {other:?}"),
    }
    assert!(matches!(
        harness.next().await,
        JobResult::Failure {
            error: IndexerError::Timeout { .. },
            ..
        }
    ));

    assert_eq!(browser.opened(), 4);
    assert_eq!(browser.closed(), 4);
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_cookies_do_not_leak_between_jobs() {
    let browser = FakeBrowser::new()
        .page(
            "https://login.test/",
            FakeDocument::new().sets_cookie("session", "abc").echo_cookies(),
        )
        .page("https://other.test/", FakeDocument::new().echo_cookies())
        .page("https://other.test/?c", FakeDocument::new().echo_cookies());

    let mut with_cookie = IndexerConfig::new(IndexType::Text, "");
    with_cookie.cookie = Some("currency=EUR; region=de".into());

    let queue = JobQueue::new();
    queue.submit(text_job("https://login.test/", Lane::Bulk));
    queue.submit(text_job("https://other.test/", Lane::Bulk));
    queue.submit(Job::new(
        "https://other.test/?c",
        OneOrMany::One(IndexTarget::new(with_cookie)),
        Lane::Bulk,
    ));

    let mut harness = spawn_worker(&browser, queue);

    assert_eq!(value_of(&harness.next().await).as_deref(), Some("cookies=[session=abc]"));
    assert_eq!(value_of(&harness.next().await).as_deref(), Some("cookies=[]"));
    assert_eq!(
        value_of(&harness.next().await).as_deref(),
        Some("cookies=[currency=EUR; region=de]")
    );

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reindex_runs_in_single_lane_with_notify() {
    let browser = FakeBrowser::new()
        .page("https://bulk.test/", FakeDocument::new().text("bulk"))
        .page("https://shop.test/p/9", FakeDocument::new().css(".price", "9.99"));

    let queue = JobQueue::new();
    queue.submit(text_job("https://bulk.test/", Lane::Bulk));
    queue.reindex(
        "https://shop.test/p/9",
        IndexTarget::new(IndexerConfig::new(IndexType::Css, ".price")).with_id(json!(9)),
        vec![json!("user-17")],
    );

    let mut harness = spawn_worker(&browser, queue);

    let first = harness.next().await;
    assert_eq!(first.job().queue, Lane::Single);
    assert_eq!(first.job().notify, vec![json!("user-17")]);
    assert_eq!(value_of(&first).as_deref(), Some("9.99"));
    assert_eq!(first.url(), "https://shop.test/p/9");

    assert_eq!(value_of(&harness.next().await).as_deref(), Some("bulk"));
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_worker_exits_when_queue_closes() {
    let browser = FakeBrowser::new();
    let harness = spawn_worker(&browser, JobQueue::new());

    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.queue.close();
    harness.worker.await.unwrap();
    assert_eq!(browser.opened(), 0);
}
