//! HTTP API handlers for the persistence service.

use crate::store::{CryptoStore, LogStore, StoredCryptoItem, StoredLogEvent};
use axum::extract::rejection::JsonRejection;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use common::{Issuer, LogEvent};
use metrics::counter;
use normalizer::schema::NormalizedItem;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub crypto: CryptoStore,
    pub logs: LogStore,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/crypto-items", post(create_crypto_item_handler))
        .route("/logs", post(create_log_handler))
        .with_state(Arc::new(state))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Incoming crypto item.
///
/// `name`, `symbol`, `price` and `scraped_at` are required; everything
/// else is optional and defaults to absent.
#[derive(Debug, Deserialize)]
struct CreateCryptoItem {
    name: String,
    symbol: String,
    price: f64,
    scraped_at: DateTime<Utc>,
    #[serde(default)]
    change_1h: Option<f64>,
    #[serde(default)]
    change_24h: Option<f64>,
    #[serde(default)]
    change_7d: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    volume_24h: Option<f64>,
    #[serde(default)]
    circulating_supply: Option<f64>,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    logo_url: Option<String>,
}

impl CreateCryptoItem {
    fn into_item(self) -> NormalizedItem {
        NormalizedItem {
            name: self.name,
            symbol: self.symbol,
            scraped_at: self.scraped_at,
            price: Some(self.price),
            change_1h: self.change_1h,
            change_24h: self.change_24h,
            change_7d: self.change_7d,
            market_cap: self.market_cap,
            volume_24h: self.volume_24h,
            circulating_supply: self.circulating_supply,
            rank: self.rank,
            logo_url: self.logo_url,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Store one normalized crypto item.
async fn create_crypto_item_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateCryptoItem>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<StoredCryptoItem>>), (StatusCode, Json<ErrorResponse>)> {
    let Json(body) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: rejection.body_text(),
            }),
        )
    })?;

    info!(
        "Storing item {}/{} scraped at {}",
        body.name, body.symbol, body.scraped_at
    );

    match state.crypto.insert(body.into_item()) {
        Ok(stored) => {
            counter!("api_items_stored_total").increment(1);
            Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
        }
        Err(e) => {
            // The failure is recorded server-side before the 500 goes out.
            state.logs.append(LogEvent::error(Issuer::Api, e.to_string()));
            counter!("api_item_errors_total").increment(1);
            error!("Failed to store item: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            ))
        }
    }
}

/// Store one operational log event.
async fn create_log_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LogEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<StoredLogEvent>>), (StatusCode, Json<ErrorResponse>)> {
    let Json(event) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: rejection.body_text(),
            }),
        )
    })?;

    counter!("api_log_events_stored_total").increment(1);
    let stored = state.logs.append(event);
    Ok((StatusCode::CREATED, Json(DataResponse { data: stored })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app_state() -> Arc<AppState> {
        Arc::new(AppState {
            crypto: CryptoStore::new(),
            logs: LogStore::new(),
        })
    }

    fn bitcoin_body() -> CreateCryptoItem {
        serde_json::from_value(json!({
            "name": "Bitcoin",
            "symbol": "BTC",
            "price": 42123.5,
            "scraped_at": "2024-01-01T00:00:00Z",
            "change_1h": -1.2,
            "market_cap": 800.5,
            "rank": 1,
        }))
        .unwrap()
    }

    #[test]
    fn test_required_fields_are_enforced() {
        let missing_price = json!({
            "name": "Bitcoin",
            "symbol": "BTC",
            "scraped_at": "2024-01-01T00:00:00Z",
        });
        assert!(serde_json::from_value::<CreateCryptoItem>(missing_price).is_err());

        let missing_issued_at = json!({
            "issuer": "STREAM_WORKER",
            "message": "boom",
            "level": "ERROR",
        });
        assert!(serde_json::from_value::<LogEvent>(missing_issued_at).is_err());
    }

    #[tokio::test]
    async fn test_create_item_returns_stored_record() {
        let state = app_state();
        let (status, Json(response)) =
            create_crypto_item_handler(State(Arc::clone(&state)), Ok(Json(bitcoin_body())))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.data.id, 1);
        assert_eq!(response.data.item.name, "Bitcoin");
        assert_eq!(response.data.item.change_1h, Some(-1.2));
        assert!(state.logs.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_item_is_a_server_error_and_logged() {
        let state = app_state();
        create_crypto_item_handler(State(Arc::clone(&state)), Ok(Json(bitcoin_body())))
            .await
            .unwrap();

        let (status, Json(response)) =
            create_crypto_item_handler(State(Arc::clone(&state)), Ok(Json(bitcoin_body())))
                .await
                .unwrap_err();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error, "Internal server error");
        assert_eq!(state.crypto.len(), 1);
        // The violation was recorded server-side with issuer API.
        assert_eq!(state.logs.len(), 1);
    }

    #[tokio::test]
    async fn test_create_log_event() {
        let state = app_state();
        let event: LogEvent = serde_json::from_value(json!({
            "issuer": "STREAM_MASTER",
            "message": "broker poll failed",
            "level": "ERROR",
            "issued_at": "2024-01-01T00:00:00Z",
            "worker_id": "worker-1",
        }))
        .unwrap();

        let (status, Json(response)) =
            create_log_handler(State(Arc::clone(&state)), Ok(Json(event)))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(response.data.id, 1);
        assert_eq!(response.data.event.issuer, Issuer::StreamMaster);
        assert_eq!(response.data.event.worker_id.as_deref(), Some("worker-1"));
    }

    #[tokio::test]
    async fn test_health_reports_liveness() {
        let Json(response) = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
