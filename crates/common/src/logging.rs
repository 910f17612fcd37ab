//! Structured log events and the best-effort API logging sink.
//!
//! Every stage reports notable failures to the persistence API's log
//! endpoint. The sink itself is the lowest-guarantee path in the system:
//! a failure to ship a log event is written to local process output and
//! otherwise swallowed. It never raises and never retries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

/// Pipeline stage that produced a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Issuer {
    Scraper,
    Broker,
    StreamMaster,
    StreamWorker,
    Api,
}

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Error,
}

/// A single operational log event.
///
/// Created at the point of failure or notable state transition, sent once,
/// never mutated or retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub issuer: Issuer,
    pub message: String,
    pub level: LogLevel,
    pub issued_at: DateTime<Utc>,
    /// Stage instance identifier (container hostname).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
    /// Start timestamp of the consumer session that produced this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start: Option<DateTime<Utc>>,
}

impl LogEvent {
    pub fn new(issuer: Issuer, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            issuer,
            message: message.into(),
            level,
            issued_at: Utc::now(),
            worker_id: None,
            session_start: None,
        }
    }

    pub fn info(issuer: Issuer, message: impl Into<String>) -> Self {
        Self::new(issuer, LogLevel::Info, message)
    }

    pub fn error(issuer: Issuer, message: impl Into<String>) -> Self {
        Self::new(issuer, LogLevel::Error, message)
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = Some(worker_id.into());
        self
    }

    pub fn with_session_start(mut self, session_start: DateTime<Utc>) -> Self {
        self.session_start = Some(session_start);
        self
    }
}

/// Destination for log events.
///
/// Implemented by [`ApiLogger`] in production; tests substitute an
/// in-process recorder.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn log(&self, event: LogEvent);
}

/// Sink that forwards log events to the persistence API's `/logs` endpoint.
#[derive(Debug, Clone)]
pub struct ApiLogger {
    http: reqwest::Client,
    base_url: String,
}

impl ApiLogger {
    /// Create a sink for the given API base URL with an explicit per-request
    /// timeout. The timeout bounds how long a caller can be held up by a
    /// single log shipment.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl LogSink for ApiLogger {
    async fn log(&self, event: LogEvent) {
        let url = format!("{}/logs", self.base_url);
        match self.http.post(&url).json(&event).send().await {
            Ok(response) if !response.status().is_success() => {
                error!(
                    "log endpoint returned {} for {:?} event: {}",
                    response.status(),
                    event.issuer,
                    event.message
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!("failed to ship log event to API: {e}");
            }
        }
    }
}
