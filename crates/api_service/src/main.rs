//! Persistence API entry point.

use anyhow::Result;
use api_service::{create_router, AppState, CryptoStore, LogStore};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
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

    let http_port: u16 = common::env::optional_parsed("HTTP_PORT", 5000)?;
    let metrics_port: u16 = common::env::optional_parsed("METRICS_PORT", 9090)?;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()?;
    info!(
        "Prometheus metrics available at http://0.0.0.0:{}/metrics",
        metrics_port
    );

    let app_state = AppState {
        crypto: CryptoStore::new(),
        logs: LogStore::new(),
    };
    let router = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{http_port}")).await?;
    info!("HTTP API listening on http://0.0.0.0:{http_port}");
    info!("Available endpoints:");
    info!("  GET  /health        - Health check");
    info!("  POST /crypto-items  - Store a normalized item");
    info!("  POST /logs          - Store a log event");

    axum::serve(listener, router).await?;

    info!("API service stopped");
    Ok(())
}
