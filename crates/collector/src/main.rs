//! Collector entry point.
//!
//! Scrape cycle: fetch the listing, buffer the items, publish every full
//! batch, sleep the configured interval, repeat. On shutdown the remaining
//! buffer is flushed and published before exit.

use anyhow::Result;
use chrono::Utc;
use collector::{
    cycle_timestamp, BatchBuffer, BatchPublisher, CollectorConfig, ItemSource, ListingClient,
};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use nats_client::{NatsClient, TopicConfig};
use normalizer::schema::RawItem;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CollectorConfig::from_env()?;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;
    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        config.metrics_port
    );

    // A broker-connection failure at initialization is fatal.
    let nats = NatsClient::connect(&config.nats_url).await?;
    nats.ensure_topic_stream(&TopicConfig::new(config.topic.as_str()))
        .await?;

    let publisher = BatchPublisher::new(nats, config.topic.as_str());
    let source = ListingClient::new(
        config.listing_url.as_str(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let mut buffer = BatchBuffer::new(config.buffer_size);

    info!(
        "Collector running (interval: {}s, buffer threshold: {})",
        config.scrape_interval_secs, config.buffer_size
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut interval = tokio::time::interval(Duration::from_secs(config.scrape_interval_secs));

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Collector received shutdown signal");
                break;
            }

            _ = interval.tick() => {
                run_cycle(&source, &mut buffer, &publisher).await;
            }
        }
    }

    // Graceful drain: whatever is left below the threshold still ships.
    if let Some(batch) = buffer.on_source_end() {
        publish_batch(&publisher, batch).await;
    }

    info!("Collector stopped");
    Ok(())
}

/// One scrape cycle. A fetch failure skips the cycle; it never stops the loop.
async fn run_cycle(source: &ListingClient, buffer: &mut BatchBuffer, publisher: &BatchPublisher) {
    let stamp = cycle_timestamp(Utc::now());

    match source.fetch_items(&stamp).await {
        Ok(items) => {
            counter!("collector_items_scraped_total").increment(items.len() as u64);
            for item in items {
                if let Some(batch) = buffer.add(item) {
                    publish_batch(publisher, batch).await;
                }
            }
        }
        Err(e) => {
            error!("Listing fetch failed, skipping cycle: {e}");
            counter!("collector_scrape_errors_total").increment(1);
        }
    }
}

async fn publish_batch(publisher: &BatchPublisher, batch: Vec<RawItem>) {
    let size = batch.len();
    match publisher.publish(&batch).await {
        Ok(()) => {
            counter!("collector_batches_published_total").increment(1);
            info!("Published batch of {size} items");
        }
        Err(e) => {
            error!("Failed to publish batch of {size} items: {e:?}");
            counter!("collector_publish_errors_total").increment(1);
        }
    }
}
