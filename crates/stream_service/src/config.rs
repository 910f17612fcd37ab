//! Stream service configuration, read from the environment at startup.

use crate::service::StreamServiceConfig;
use common::env::{optional_parsed, required, ConfigError};

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Broker address.
    pub nats_url: String,
    /// Deployment topic name; doubles as the consumer group name.
    pub topic: String,
    /// Persistence API base URL.
    pub api_base_url: String,
    /// Bounded poll expiry in seconds.
    pub poll_timeout_secs: u64,
    /// Max broker messages taken per poll.
    pub max_poll_messages: usize,
    /// Worker pool bound for per-batch dispatch.
    pub delivery_workers: usize,
    /// Timeout applied to every API request.
    pub request_timeout_secs: u64,
    /// Prometheus exporter port.
    pub metrics_port: u16,
}

impl StreamConfig {
    /// Load and validate the configuration. Any missing required value is
    /// a fatal startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            nats_url: required("NATS_URL")?,
            topic: required("BROKER_TOPIC")?,
            api_base_url: required("API_BASE_URL")?,
            poll_timeout_secs: optional_parsed("POLL_TIMEOUT_SECS", 1)?,
            max_poll_messages: optional_parsed("MAX_POLL_MESSAGES", 10)?,
            delivery_workers: optional_parsed("DELIVERY_WORKERS", 8)?,
            request_timeout_secs: optional_parsed("REQUEST_TIMEOUT_SECS", 10)?,
            metrics_port: optional_parsed("METRICS_PORT", 9092)?,
        })
    }

    /// Loop configuration for [`crate::StreamService`].
    pub fn service_config(&self) -> StreamServiceConfig {
        StreamServiceConfig {
            topic: self.topic.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
            max_poll_messages: self.max_poll_messages,
            delivery_workers: self.delivery_workers,
        }
    }
}
