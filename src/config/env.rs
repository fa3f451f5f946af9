//! Environment loading for `WorkerConfig`
//!
//! | Variable | Effect |
//! |---|---|
//! | `INDEXER_ENDPOINT` | coordinator URL; derived when unset |
//! | `NODE_ENV` / `APP_ENV` / `PORT` | `development` or `test` selects `ws://localhost:$PORT` |
//! | `INDEXER_TOKEN` | worker credential (required) |
//! | `INDEXER_HEARTBEAT_MS` | coordinator ping interval |
//! | `INDEXER_HEADLESS` | `false` / `0` shows the browser window |
//! | `INDEXER_CHROME_DATA_DIR` | browser profile directory |
//! | `CHROMIUM_PATH` | browser executable |

use std::str::FromStr;

use super::types::{ConfigError, WorkerConfig};
use crate::utils::DEFAULT_ENDPOINT;

impl WorkerConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let endpoint = var("INDEXER_ENDPOINT").unwrap_or_else(|| {
            let local = var("NODE_ENV").as_deref() == Some("development")
                || var("APP_ENV").as_deref() == Some("test");
            if local {
                format!("ws://localhost:{}", var("PORT").unwrap_or_else(|| "3000".to_string()))
            } else {
                DEFAULT_ENDPOINT.to_string()
            }
        });

        let token = var("INDEXER_TOKEN").ok_or(ConfigError::Missing("INDEXER_TOKEN"))?;

        let mut builder = WorkerConfig::builder().endpoint(endpoint).token(token);

        if let Some(ms) = parse::<u64>(var("INDEXER_HEARTBEAT_MS"), "INDEXER_HEARTBEAT_MS")? {
            builder = builder.heartbeat_interval_ms(ms);
        }
        if let Some(raw) = var("INDEXER_HEADLESS") {
            builder = builder.headless(parse_bool(&raw, "INDEXER_HEADLESS")?);
        }
        if let Some(dir) = var("INDEXER_CHROME_DATA_DIR") {
            builder = builder.chrome_data_dir(dir);
        }
        if let Some(path) = var("CHROMIUM_PATH") {
            builder = builder.chromium_path(path);
        }

        builder.build()
    }
}

fn parse<T: FromStr>(raw: Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("'{value}': {e}"),
        })
    })
    .transpose()
}

fn parse_bool(raw: &str, name: &'static str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name,
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}
