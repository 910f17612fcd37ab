//! Per-item delivery to the persistence API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Issuer, LogEvent, LogSink};
use metrics::counter;
use normalizer::normalize_item;
use normalizer::schema::RawItem;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Outcome of one item delivery.
///
/// Failure is terminal for the item: it has already been logged, the
/// caller does not retry and moves on to the next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed,
}

/// Delivery seam. The consumer loop is generic over it so batch dispatch
/// can be exercised with an in-process fake.
#[async_trait]
pub trait Deliver: Send + Sync + 'static {
    async fn deliver(&self, item: RawItem) -> Delivery;
}

/// Sends one normalized record per raw item to `POST /crypto-items`.
///
/// The request timeout is explicit; there is no retry. A non-2xx response
/// or transport failure emits one STREAM_WORKER error event through the
/// sink and resolves to [`Delivery::Failed`].
pub struct DeliveryClient {
    http: reqwest::Client,
    api_base_url: String,
    sink: Arc<dyn LogSink>,
    worker_id: String,
    session_start: DateTime<Utc>,
}

impl DeliveryClient {
    pub fn new(
        api_base_url: impl Into<String>,
        timeout: Duration,
        sink: Arc<dyn LogSink>,
        worker_id: impl Into<String>,
        session_start: DateTime<Utc>,
    ) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base_url: api_base_url.into(),
            sink,
            worker_id: worker_id.into(),
            session_start,
        })
    }

    async fn report_failure(&self, message: String) {
        error!("{message}");
        counter!("stream_delivery_errors_total").increment(1);
        let event = LogEvent::error(Issuer::StreamWorker, message)
            .with_worker_id(self.worker_id.as_str())
            .with_session_start(self.session_start);
        self.sink.log(event).await;
    }
}

#[async_trait]
impl Deliver for DeliveryClient {
    async fn deliver(&self, item: RawItem) -> Delivery {
        // scraped_at falls back to ingestion time when the cycle stamp is
        // absent upstream.
        let normalized = match normalize_item(&item, Utc::now()) {
            Ok(normalized) => normalized,
            Err(e) => {
                self.report_failure(e.to_string()).await;
                return Delivery::Failed;
            }
        };

        let url = format!("{}/crypto-items", self.api_base_url);
        match self.http.post(&url).json(&normalized).send().await {
            Ok(response) if response.status().is_success() => {
                counter!("stream_items_delivered_total").increment(1);
                debug!(
                    "Delivered {}/{} scraped at {}",
                    normalized.name, normalized.symbol, normalized.scraped_at
                );
                Delivery::Delivered
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                self.report_failure(format!(
                    "API returned {} for {}/{}: {}",
                    status, normalized.name, normalized.symbol, body
                ))
                .await;
                Delivery::Failed
            }
            Err(e) => {
                self.report_failure(format!(
                    "failed to send {}/{} to API: {}",
                    normalized.name, normalized.symbol, e
                ))
                .await;
                Delivery::Failed
            }
        }
    }
}
