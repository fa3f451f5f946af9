//! Shared configuration constants for the indexer worker
//!
//! Default values used by `WorkerConfig` and the engine so the same number
//! never appears in two places.

/// Minimum time between two visits of the same URL: 15 seconds
///
/// Jobs arriving sooner are deferred, not failed.
pub const DEFAULT_MIN_REVISIT_INTERVAL_MS: u64 = 15_000;

/// Interval at which the coordinator pings connected workers
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;

/// Latency allowance added on top of the heartbeat interval before the
/// connection is considered dead
pub const DEFAULT_HEARTBEAT_GRACE_MS: u64 = 2_000;

/// Delay between a closed connection and the next connection attempt
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// A connection attempt that is not open after this long is terminated
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Upper bound on a `nextIndexerId` chain
///
/// Chains are expected to be short; anything this deep is a
/// misconfiguration and fails the job instead of looping.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 64;

/// Results held while the control channel is down
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Selector matched by the JSON index type when reading a page
pub const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Channel identifier expected by the coordinator's cable server
pub const INDEXER_CHANNEL: &str = "IndexerChannel";

/// Production coordinator used when no endpoint is configured
pub const DEFAULT_ENDPOINT: &str = "wss://idealguides.com";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
