//! Batch publication to the broker.

use anyhow::Result;
use bytes::Bytes;
use nats_client::NatsClient;
use normalizer::schema::RawItem;
use tracing::debug;

/// Constant partition key attached to every batch of this domain.
pub const PARTITION_KEY: &str = "crypto";

/// Serializes flushed batches and emits them to the configured topic.
///
/// One message per flush. No application-level retry: the broker client's
/// publish acknowledgment is the delivery guarantee.
pub struct BatchPublisher {
    nats: NatsClient,
    topic: String,
}

impl BatchPublisher {
    pub fn new(nats: NatsClient, topic: impl Into<String>) -> Self {
        Self {
            nats,
            topic: topic.into(),
        }
    }

    /// Publish one ordered batch as a single message.
    pub async fn publish(&self, batch: &[RawItem]) -> Result<()> {
        let payload = serde_json::to_vec(batch)?;
        self.nats
            .publish_batch(&self.topic, PARTITION_KEY, Bytes::from(payload))
            .await?;
        debug!("Published batch of {} items to '{}'", batch.len(), self.topic);
        Ok(())
    }
}
