//! Stream service entry point.

use anyhow::Result;
use chrono::Utc;
use common::{ApiLogger, LogSink};
use metrics_exporter_prometheus::PrometheusBuilder;
use nats_client::NatsClient;
use std::sync::Arc;
use std::time::Duration;
use stream_service::{DeliveryClient, StreamConfig, StreamService};
use tokio::sync::mpsc;
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

    let config = StreamConfig::from_env()?;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;
    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        config.metrics_port
    );

    // A broker-connection failure at initialization is fatal.
    let nats = NatsClient::connect(&config.nats_url).await?;

    let request_timeout = Duration::from_secs(config.request_timeout_secs);
    let sink: Arc<dyn LogSink> =
        Arc::new(ApiLogger::new(config.api_base_url.as_str(), request_timeout)?);

    // One session per consumer process; identifies its log events.
    let worker_id = common::env::worker_id();
    let session_start = Utc::now();

    let delivery = Arc::new(DeliveryClient::new(
        config.api_base_url.as_str(),
        request_timeout,
        Arc::clone(&sink),
        worker_id.as_str(),
        session_start,
    )?);

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let service = StreamService::new(
        nats,
        delivery,
        sink,
        config.service_config(),
        worker_id,
        session_start,
        shutdown_rx,
    );

    let handle = tokio::spawn(async move {
        if let Err(e) = service.run().await {
            error!("Stream service failed: {e:?}");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutting down stream service...");
    let _ = shutdown_tx.send(()).await;
    let _ = handle.await;

    Ok(())
}
