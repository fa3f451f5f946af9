// Indexer worker
//
// Connects to the coordinator, receives indexing jobs and extracts values
// with a headless Chromium. Exits non-zero when the browser dies so the
// process supervisor can restart it.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use indexer_worker::{
    BrowserSession, ControlChannel, JobQueue, JobWorker, PageExtractor, RateLimiter,
    SelectorPipeline, WorkerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("indexer_worker=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    info!("Starting indexer worker against {}", config.endpoint());

    let session = Arc::new(
        BrowserSession::launch(config.session_settings())
            .await
            .context("Failed to start browser")?,
    );

    let queue = JobQueue::new();
    let (results_tx, results_rx) = mpsc::unbounded_channel();

    let worker = JobWorker::new(
        queue.clone(),
        Arc::new(RateLimiter::new(config.min_revisit_interval())),
        Arc::clone(&session),
        PageExtractor::new(SelectorPipeline::default(), config.extractor_settings()),
        results_tx,
        config.job_timeout(),
    );
    let channel = ControlChannel::new(config.channel_settings(), queue.clone(), results_rx);

    let mut worker_task = tokio::spawn(worker.run());
    let channel_task = tokio::spawn(channel.run());

    let mut worker_joined = false;
    let outcome = tokio::select! {
        () = session.closed() => {
            error!("Browser exited; shutting down");
            Err(anyhow::anyhow!("browser process exited"))
        }
        joined = &mut worker_task => {
            worker_joined = true;
            error!("Job worker stopped unexpectedly");
            joined.context("Job worker panicked").and(Err(anyhow::anyhow!("job worker stopped")))
        }
        signal = tokio::signal::ctrl_c() => {
            info!("Received interrupt; shutting down");
            signal.context("Failed to listen for interrupt")
        }
    };

    channel_task.abort();
    queue.close();
    if !worker_joined {
        worker_task.abort();
        let _ = worker_task.await;
    }

    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown().await?,
        Err(_) => error!("Browser session still in use at shutdown"),
    }

    outcome
}
