//! Broker consumer loop.

use crate::delivery::Deliver;
use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{Issuer, LogEvent, LogSink};
use futures::StreamExt;
use metrics::counter;
use nats_client::{NatsClient, PullConsumer, TopicConfig};
use normalizer::schema::RawItem;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Loop configuration for the stream service.
#[derive(Debug, Clone)]
pub struct StreamServiceConfig {
    /// Topic name; also the consumer group (durable) name.
    pub topic: String,
    /// Bounded poll expiry. Keeps the loop responsive to shutdown.
    pub poll_timeout_secs: u64,
    /// Max broker messages taken per poll.
    pub max_poll_messages: usize,
    /// Worker pool bound for per-batch item dispatch.
    pub delivery_workers: usize,
}

/// Polls the broker for batches and dispatches every item through the
/// delivery seam.
///
/// Broker-level errors are logged (issuer STREAM_MASTER) and skipped; the
/// loop only exits on the shutdown signal. The in-flight batch finishes
/// before the loop returns.
pub struct StreamService<D: Deliver> {
    nats: NatsClient,
    delivery: Arc<D>,
    sink: Arc<dyn LogSink>,
    config: StreamServiceConfig,
    worker_id: String,
    session_start: DateTime<Utc>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<D: Deliver> StreamService<D> {
    pub fn new(
        nats: NatsClient,
        delivery: Arc<D>,
        sink: Arc<dyn LogSink>,
        config: StreamServiceConfig,
        worker_id: impl Into<String>,
        session_start: DateTime<Utc>,
        shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            nats,
            delivery,
            sink,
            config,
            worker_id: worker_id.into(),
            session_start,
            shutdown_rx,
        }
    }

    /// Run the consumer loop until shutdown.
    pub async fn run(mut self) -> Result<()> {
        let topic = TopicConfig::new(self.config.topic.as_str());
        // Stream/consumer provisioning failure at initialization is fatal.
        let consumer = self.nats.batch_consumer(&topic).await?;

        info!(
            "Stream service running (consumer group '{}', session start {})",
            self.config.topic, self.session_start
        );

        let poll_expiry = Duration::from_secs(self.config.poll_timeout_secs);

        loop {
            tokio::select! {
                biased;  // Prioritize shutdown signal

                _ = self.shutdown_rx.recv() => {
                    info!("Stream service received shutdown signal");
                    break;
                }

                polled = poll_once(&consumer, self.config.max_poll_messages, poll_expiry) => {
                    match polled {
                        // An empty poll is a timeout, not an error.
                        Ok(messages) => {
                            for message in messages {
                                match message {
                                    Ok(message) => self.handle_message(message).await,
                                    Err(e) => {
                                        self.report_broker_error(format!(
                                            "broker error on polled message: {e}"
                                        ))
                                        .await;
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            self.report_broker_error(format!("broker poll failed: {e}")).await;
                        }
                    }
                }
            }
        }

        info!("Stream service stopped");
        Ok(())
    }

    /// Process one batch message.
    async fn handle_message(&self, message: async_nats::jetstream::Message) {
        counter!("stream_batches_received_total").increment(1);

        match serde_json::from_slice::<Vec<RawItem>>(&message.payload) {
            Ok(batch) => {
                let size = batch.len();
                dispatch_batch(&self.delivery, batch, self.config.delivery_workers).await;
                debug!("Dispatched batch of {size} items");
            }
            Err(e) => {
                // A poison payload must not wedge the consumer group.
                self.report_broker_error(format!("undecodable batch payload: {e}"))
                    .await;
            }
        }

        // Ack after dispatch: at-least-once, a crash mid-batch redelivers.
        if let Err(e) = message.ack().await {
            warn!("Failed to ack message: {e:?}");
        }
    }

    async fn report_broker_error(&self, message: String) {
        error!("{message}");
        counter!("stream_broker_errors_total").increment(1);
        let event = LogEvent::error(Issuer::StreamMaster, message)
            .with_worker_id(self.worker_id.as_str())
            .with_session_start(self.session_start);
        self.sink.log(event).await;
    }
}

/// Fetch one bounded batch of messages from the durable consumer.
async fn poll_once(
    consumer: &PullConsumer,
    max_messages: usize,
    expires: Duration,
) -> Result<Vec<Result<async_nats::jetstream::Message>>> {
    let mut fetched = consumer
        .fetch()
        .max_messages(max_messages)
        .expires(expires)
        .messages()
        .await?;

    let mut messages = Vec::new();
    while let Some(message) = fetched.next().await {
        messages.push(message.map_err(anyhow::Error::from_boxed));
    }
    Ok(messages)
}

/// Dispatch a batch across the bounded worker pool.
///
/// Items are independent: a failed delivery has already been logged by
/// the delivery client and never aborts the remaining items. Order within
/// the batch is not preserved; no item is dropped.
pub async fn dispatch_batch<D: Deliver>(delivery: &Arc<D>, batch: Vec<RawItem>, workers: usize) {
    futures::stream::iter(batch)
        .for_each_concurrent(workers.max(1), |item| {
            let delivery = Arc::clone(delivery);
            async move {
                delivery.deliver(item).await;
            }
        })
        .await;
}
