//! Type-safe builder for `WorkerConfig` using the typestate pattern
//!
//! `endpoint` and `token` must be set, in that order, before `build` exists.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{ConfigError, WorkerConfig};

// Type states for the builder
pub struct WithEndpoint;
pub struct Complete;

pub struct WorkerConfigBuilder<State = ()> {
    config: WorkerConfig,
    _phantom: PhantomData<State>,
}

impl Default for WorkerConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: WorkerConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl WorkerConfig {
    /// Create a builder for configuring a `WorkerConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> WorkerConfigBuilder<()> {
        WorkerConfigBuilder::default()
    }
}

impl<S> WorkerConfigBuilder<S> {
    fn transition<T>(self) -> WorkerConfigBuilder<T> {
        WorkerConfigBuilder {
            config: self.config,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn heartbeat_grace_ms(mut self, ms: u64) -> Self {
        self.config.heartbeat_grace_ms = ms;
        self
    }

    #[must_use]
    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn outbound_buffer(mut self, capacity: usize) -> Self {
        self.config.outbound_buffer = capacity;
        self
    }

    #[must_use]
    pub fn min_revisit_interval_ms(mut self, ms: u64) -> Self {
        self.config.min_revisit_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn selector_timeout_secs(mut self, secs: u64) -> Self {
        self.config.selector_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn job_timeout_secs(mut self, secs: u64) -> Self {
        self.config.job_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.config.max_chain_depth = depth;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn disable_stealth(mut self, disable: bool) -> Self {
        self.config.disable_stealth = disable;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chromium_path = Some(path.into());
        self
    }
}

impl WorkerConfigBuilder<()> {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> WorkerConfigBuilder<WithEndpoint> {
        self.config.endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        self.transition()
    }
}

impl WorkerConfigBuilder<WithEndpoint> {
    pub fn token(mut self, token: impl Into<String>) -> WorkerConfigBuilder<Complete> {
        self.config.token = token.into();
        self.transition()
    }
}

// Build method only available when all required fields are set
impl WorkerConfigBuilder<Complete> {
    pub fn build(self) -> Result<WorkerConfig, ConfigError> {
        let config = self.config;

        let scheme_ok = url::Url::parse(&config.endpoint)
            .map(|u| matches!(u.scheme(), "ws" | "wss"))
            .unwrap_or(false);
        if !scheme_ok {
            return Err(ConfigError::Invalid {
                name: "endpoint",
                reason: format!("'{}' is not a ws:// or wss:// URL", config.endpoint),
            });
        }

        if config.token.trim().is_empty() {
            return Err(ConfigError::Missing("token"));
        }

        for (name, value) in [
            ("heartbeat_interval_ms", config.heartbeat_interval_ms),
            ("connect_timeout_ms", config.connect_timeout_ms),
            ("navigation_timeout_secs", config.navigation_timeout_secs),
            ("job_timeout_secs", config.job_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if config.max_chain_depth == 0 {
            return Err(ConfigError::Invalid {
                name: "max_chain_depth",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(config)
    }
}
