//! Thin NATS JetStream wrapper for the coinflow pipeline.

mod client;

pub use client::{NatsClient, PullConsumer, TopicConfig, BATCH_KEY_HEADER};
