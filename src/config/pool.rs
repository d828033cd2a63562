//! Worker configuration structures.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::{PoolConfig, ProcessorSettings, MAX_RECEIVE_BATCH};

const fn default_concurrency() -> usize {
    1
}
const fn default_retry_interval_ms() -> u64 {
    5_000
}
const fn default_wait_time_ms() -> u64 {
    10_000
}
const fn default_http_timeout_secs() -> u64 {
    30
}
const fn default_long_poll_wait_secs() -> u64 {
    20
}
const fn default_max_messages() -> usize {
    MAX_RECEIVE_BATCH
}
const fn default_idle_interval_ms() -> u64 {
    1_000
}

/// Pool sizing and timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Number of execution units.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Delay before a failed unit is replaced, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Shutdown bound, in milliseconds.
    #[serde(default = "default_wait_time_ms")]
    pub wait_time_ms: u64,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            retry_interval_ms: default_retry_interval_ms(),
            wait_time_ms: default_wait_time_ms(),
        }
    }
}

/// Queue connection and polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueOptions {
    /// URL of the queue to consume.
    #[serde(default)]
    pub queue_url: String,
    /// Region the queue lives in.
    #[serde(default)]
    pub region: String,
    /// Endpoint override, for local or compatible services.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Static access key id.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Static secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Per-operation timeout, in seconds. Must exceed the long-poll wait.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Long-poll wait per receive, in seconds.
    #[serde(default = "default_long_poll_wait_secs")]
    pub long_poll_wait_secs: u64,
    /// Messages requested per receive.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Pause after an empty receive, in milliseconds.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            region: String::new(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            http_timeout_secs: default_http_timeout_secs(),
            long_poll_wait_secs: default_long_poll_wait_secs(),
            max_messages: default_max_messages(),
            idle_interval_ms: default_idle_interval_ms(),
        }
    }
}

/// Root worker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Pool settings.
    #[serde(default)]
    pub pool: PoolOptions,
    /// Queue settings.
    #[serde(default)]
    pub queue: QueueOptions,
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|raw| raw.trim().to_string()) {
        None => Ok(default),
        Some(raw) if raw.is_empty() => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("`{raw}`: {e}"),
        }),
    }
}

fn optional_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

impl WorkerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_CONCURRENCY",
                reason: "must be greater than 0".into(),
            });
        }
        if self.queue.queue_url.trim().is_empty() {
            return Err(ConfigError::Missing("SQS_QUEUE_URL"));
        }
        if self.queue.region.trim().is_empty() {
            return Err(ConfigError::Missing("AWS_REGION"));
        }
        match (&self.queue.access_key_id, &self.queue.secret_access_key) {
            (Some(_), None) => return Err(ConfigError::Missing("AWS_SECRET_ACCESS_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("AWS_ACCESS_KEY_ID")),
            _ => {}
        }
        if !(1..=MAX_RECEIVE_BATCH).contains(&self.queue.max_messages) {
            return Err(ConfigError::Invalid {
                key: "SQS_MAX_MESSAGES",
                reason: format!("must be between 1 and {MAX_RECEIVE_BATCH}"),
            });
        }
        if self.queue.long_poll_wait_secs > 20 {
            return Err(ConfigError::Invalid {
                key: "SQS_LONG_POLLING_WAIT_SECS",
                reason: "must be at most 20".into(),
            });
        }
        if self.queue.http_timeout_secs <= self.queue.long_poll_wait_secs {
            return Err(ConfigError::Invalid {
                key: "SQS_HTTP_TIMEOUT_SECS",
                reason: "must exceed the long-poll wait".into(),
            });
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, otherwise the
    /// validation error.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable values or failed validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset or blank keys
    /// take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable values or failed validation.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cfg = Self {
            pool: PoolOptions {
                concurrency: parse_var(&lookup, "WORKER_CONCURRENCY", default_concurrency())?,
                retry_interval_ms: parse_var(
                    &lookup,
                    "WORKER_RETRY_INTERVAL_MS",
                    default_retry_interval_ms(),
                )?,
                wait_time_ms: parse_var(&lookup, "WORKER_WAIT_TIME_MS", default_wait_time_ms())?,
            },
            queue: QueueOptions {
                queue_url: optional_var(&lookup, "SQS_QUEUE_URL").unwrap_or_default(),
                region: optional_var(&lookup, "AWS_REGION").unwrap_or_default(),
                endpoint: optional_var(&lookup, "AWS_SQS_HOST"),
                access_key_id: optional_var(&lookup, "AWS_ACCESS_KEY_ID"),
                secret_access_key: optional_var(&lookup, "AWS_SECRET_ACCESS_KEY"),
                http_timeout_secs: parse_var(
                    &lookup,
                    "SQS_HTTP_TIMEOUT_SECS",
                    default_http_timeout_secs(),
                )?,
                long_poll_wait_secs: parse_var(
                    &lookup,
                    "SQS_LONG_POLLING_WAIT_SECS",
                    default_long_poll_wait_secs(),
                )?,
                max_messages: parse_var(&lookup, "SQS_MAX_MESSAGES", default_max_messages())?,
                idle_interval_ms: parse_var(
                    &lookup,
                    "SQS_IDLE_INTERVAL_MS",
                    default_idle_interval_ms(),
                )?,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pool timing derived from these options.
    #[must_use]
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.pool.concurrency)
            .with_retry_interval(Duration::from_millis(self.pool.retry_interval_ms))
            .with_wait_time(Duration::from_millis(self.pool.wait_time_ms))
    }

    /// Processor polling settings derived from these options.
    #[must_use]
    pub fn to_processor_settings(&self) -> ProcessorSettings {
        ProcessorSettings::default()
            .with_max_messages(self.queue.max_messages)
            .with_long_poll_wait(Duration::from_secs(self.queue.long_poll_wait_secs))
            .with_idle_interval(Duration::from_millis(self.queue.idle_interval_ms))
    }
}
