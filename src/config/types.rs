//! Core configuration types for the indexer worker

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_ENDPOINT, DEFAULT_HEARTBEAT_GRACE_MS,
    DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_MIN_REVISIT_INTERVAL_MS,
    DEFAULT_OUTBOUND_BUFFER, DEFAULT_RECONNECT_DELAY_MS,
};

/// Invalid or missing configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for one worker process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Coordinator base URL, `ws://` or `wss://`
    pub(crate) endpoint: String,
    /// Worker credential, embedded in the connection path
    #[serde(skip_serializing)]
    pub(crate) token: String,

    /// Interval at which the coordinator pings
    pub(crate) heartbeat_interval_ms: u64,
    /// Latency allowance on top of the heartbeat interval
    pub(crate) heartbeat_grace_ms: u64,
    pub(crate) reconnect_delay_ms: u64,
    pub(crate) connect_timeout_ms: u64,
    /// Results held while disconnected; oldest dropped beyond this
    pub(crate) outbound_buffer: usize,

    /// Default minimum time between two visits of one URL
    pub(crate) min_revisit_interval_ms: u64,

    /// Timeout in seconds for `document.readyState` to reach `complete`
    pub(crate) page_load_timeout_secs: u64,
    /// Timeout in seconds for `page.goto()`
    pub(crate) navigation_timeout_secs: u64,
    /// How long selectors are retried before a target counts as unmatched
    pub(crate) selector_timeout_secs: u64,
    /// Upper bound on one job, context setup to teardown
    pub(crate) job_timeout_secs: u64,
    pub(crate) max_chain_depth: usize,

    pub(crate) headless: bool,
    pub(crate) disable_stealth: bool,
    /// Chrome profile directory; a per-process temp dir when unset
    pub(crate) chrome_data_dir: Option<PathBuf>,
    /// Explicit browser executable; discovery runs when unset
    pub(crate) chromium_path: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            heartbeat_grace_ms: DEFAULT_HEARTBEAT_GRACE_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            min_revisit_interval_ms: DEFAULT_MIN_REVISIT_INTERVAL_MS,
            page_load_timeout_secs: 30,
            navigation_timeout_secs: 30,
            selector_timeout_secs: 10,
            job_timeout_secs: 90,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            headless: true,
            disable_stealth: false,
            chrome_data_dir: None,
            chromium_path: None,
        }
    }
}
