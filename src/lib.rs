pub mod browser_session;
pub mod browser_setup;
pub mod config;
pub mod control_channel;
pub mod indexer;
pub mod indexer_engine;
pub mod kromekover;
pub mod page_extractor;
pub mod selector_pipeline;
pub mod utils;

pub use browser_session::{
    BrowserSession, ContextOptions, ContextProvider, JobContext, SessionSettings,
    with_job_context,
};
pub use browser_setup::{LaunchOptions, download_managed_browser, find_browser_executable, launch_browser};
pub use config::{ConfigError, WorkerConfig};
pub use control_channel::{ChannelError, ChannelSettings, ChannelState, ControlChannel};
pub use indexer::{
    DataToIndex, IndexResponse, IndexTarget, IndexType, IndexedValue, IndexerConfig, IndexerId,
    IndexerRegistry, Job, Lane, OneOrMany,
};
pub use indexer_engine::{
    FailureKind, IndexerError, JobQueue, JobResult, JobWorker, RateLimitDecision, RateLimiter,
};
pub use page_extractor::{ExtractorSettings, IndexerPage, PageExtractor, QueryKind};
pub use selector_pipeline::{PostProcessorRegistry, SelectorPipeline};
