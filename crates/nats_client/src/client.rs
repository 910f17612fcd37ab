//! NATS client implementation with JetStream support.
//!
//! The pipeline uses one JetStream stream per deployment topic. Producers
//! publish whole batches as single messages with a constant partition key
//! carried in a header; consumers attach as a durable pull consumer whose
//! durable name equals the topic name, so every instance sharing a topic
//! joins the same consumer group.

use anyhow::Result;
use async_nats::jetstream::consumer::pull;
use async_nats::jetstream::{self, stream::Stream};
use async_nats::{Client, HeaderMap};
use std::time::Duration;
use tracing::info;

/// Header carrying the batch partition key.
pub const BATCH_KEY_HEADER: &str = "Batch-Key";

/// Default retention period for topic streams (24 hours).
pub const DEFAULT_RETENTION_SECS: u64 = 86_400;

/// Default max messages per stream.
pub const DEFAULT_MAX_MESSAGES: i64 = 1_000_000;

/// Default max bytes per stream (1GB).
pub const DEFAULT_MAX_BYTES: i64 = 1_073_741_824;

/// Durable pull consumer handle used by the consume-and-deliver role.
pub type PullConsumer = jetstream::consumer::Consumer<pull::Config>;

/// Configuration for a deployment topic.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    /// Topic name; doubles as subject and consumer group name.
    pub name: String,
    /// Retention period in seconds.
    pub max_age_secs: u64,
    /// Maximum number of messages.
    pub max_messages: i64,
    /// Maximum bytes.
    pub max_bytes: i64,
}

impl TopicConfig {
    /// Create a topic config with default limits.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_age_secs: DEFAULT_RETENTION_SECS,
            max_messages: DEFAULT_MAX_MESSAGES,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Set retention period in seconds.
    pub fn with_retention(mut self, secs: u64) -> Self {
        self.max_age_secs = secs;
        self
    }

    /// Backing stream name for this topic.
    pub fn stream_name(&self) -> String {
        self.name.to_uppercase().replace(['.', '-'], "_")
    }
}

/// Wrapper around the NATS client with JetStream context.
#[derive(Clone)]
pub struct NatsClient {
    jetstream: jetstream::Context,
}

impl NatsClient {
    /// Connect to a NATS server and create a JetStream context.
    ///
    /// A connection failure here is fatal for the calling process; there is
    /// no application-level reconnect beyond what the client provides.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);
        let client: Client = async_nats::connect(url).await?;
        let jetstream = jetstream::new(client);

        Ok(Self { jetstream })
    }

    /// Create or get the backing stream for a topic.
    pub async fn ensure_topic_stream(&self, topic: &TopicConfig) -> Result<Stream> {
        let stream_name = topic.stream_name();
        info!(
            "Ensuring stream '{}' exists (subject: {}, retention: {}s)",
            stream_name, topic.name, topic.max_age_secs
        );

        let stream = self
            .jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: stream_name.clone(),
                subjects: vec![topic.name.clone()],
                retention: jetstream::stream::RetentionPolicy::Limits,
                max_messages: topic.max_messages,
                max_bytes: topic.max_bytes,
                max_age: Duration::from_secs(topic.max_age_secs),
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await?;

        info!("Stream '{}' ready", stream_name);
        Ok(stream)
    }

    /// Publish one batch message to a topic with its partition key.
    ///
    /// The JetStream acknowledgment is awaited, so a successful return means
    /// the broker has accepted the message (at-least-once handoff). There is
    /// no application-level retry on top of that.
    pub async fn publish_batch(
        &self,
        topic: &str,
        key: &str,
        payload: bytes::Bytes,
    ) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(BATCH_KEY_HEADER, key);

        self.jetstream
            .publish_with_headers(topic.to_string(), headers, payload)
            .await?
            .await?;
        Ok(())
    }

    /// Create or get the durable pull consumer for a topic.
    ///
    /// The durable name is the topic name itself, so all consumer instances
    /// across deployments sharing the topic compete over one group.
    pub async fn batch_consumer(&self, topic: &TopicConfig) -> Result<PullConsumer> {
        let stream = self.ensure_topic_stream(topic).await?;
        info!(
            "Attaching durable consumer '{}' to stream '{}'",
            topic.name,
            topic.stream_name()
        );

        let consumer = stream
            .get_or_create_consumer(
                &topic.name,
                pull::Config {
                    durable_name: Some(topic.name.clone()),
                    ..Default::default()
                },
            )
            .await?;

        Ok(consumer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_stream_name() {
        let topic = TopicConfig::new("crypto-items");
        assert_eq!(topic.stream_name(), "CRYPTO_ITEMS");
    }

    #[test]
    fn test_topic_retention_override() {
        let topic = TopicConfig::new("crypto").with_retention(60);
        assert_eq!(topic.max_age_secs, 60);
        assert_eq!(topic.max_messages, DEFAULT_MAX_MESSAGES);
    }
}
