//! Getter methods for `WorkerConfig`
//!
//! Millisecond and second fields are exposed as `Duration`, plus the
//! component settings each subsystem is constructed from.

use std::path::Path;
use std::time::Duration;

use super::types::WorkerConfig;
use crate::browser_session::SessionSettings;
use crate::browser_setup::LaunchOptions;
use crate::control_channel::ChannelSettings;
use crate::page_extractor::{ExtractorSettings, PageTimeouts};

impl WorkerConfig {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub fn heartbeat_grace(&self) -> Duration {
        Duration::from_millis(self.heartbeat_grace_ms)
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn outbound_buffer(&self) -> usize {
        self.outbound_buffer
    }

    #[must_use]
    pub fn min_revisit_interval(&self) -> Duration {
        Duration::from_millis(self.min_revisit_interval_ms)
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    #[must_use]
    pub fn max_chain_depth(&self) -> usize {
        self.max_chain_depth
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&Path> {
        self.chrome_data_dir.as_deref()
    }

    #[must_use]
    pub fn chromium_path(&self) -> Option<&Path> {
        self.chromium_path.as_deref()
    }

    #[must_use]
    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            heartbeat_interval: self.heartbeat_interval(),
            heartbeat_grace: self.heartbeat_grace(),
            reconnect_delay: self.reconnect_delay(),
            connect_timeout: self.connect_timeout(),
            outbound_buffer: self.outbound_buffer,
        }
    }

    #[must_use]
    pub fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            max_chain_depth: self.max_chain_depth,
            selector_timeout: self.selector_timeout(),
            ..ExtractorSettings::default()
        }
    }

    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            launch: LaunchOptions {
                headless: self.headless,
                executable: self.chromium_path.clone(),
                user_data_dir: self.chrome_data_dir.clone(),
                request_timeout: self.navigation_timeout(),
            },
            page_timeouts: PageTimeouts {
                navigation: self.navigation_timeout(),
                page_load: self.page_load_timeout(),
                ..PageTimeouts::default()
            },
            disable_stealth: self.disable_stealth,
        }
    }
}
