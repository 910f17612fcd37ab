//! Item sources for the scrape-and-buffer role.
//!
//! The listing site is an untrusted, free-form producer. The client
//! fetches the ranked-table feed and applies the producer-side
//! invariants: ranks are positive, unique within a cycle, and bounded to
//! the top-N; every item of a cycle carries the same timestamp.

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use normalizer::schema::{PercentField, RawItem};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

/// Upper bound on ranked rows taken per scrape cycle.
pub const TOP_N: u32 = 10;

/// Produces one scrape cycle's worth of raw items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch the current listing, with every item stamped with the given
    /// cycle timestamp.
    async fn fetch_items(&self, cycle_stamp: &str) -> Result<Vec<RawItem>>;
}

/// Scrape-cycle timestamp: truncated to the minute, ISO-8601.
pub fn cycle_timestamp(now: DateTime<Utc>) -> String {
    let truncated = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    truncated.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// One row of the listing feed, loosely typed.
///
/// Numeric-looking cells may arrive as strings or numbers depending on
/// the feed revision, so they all go through [`string_or_number`].
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(default, deserialize_with = "string_or_number")]
    rank: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    change_1h: Option<String>,
    #[serde(default)]
    icon_1h: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    change_24h: Option<String>,
    #[serde(default)]
    icon_24h: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    change_7d: Option<String>,
    #[serde(default)]
    icon_7d: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    market_cap: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    volume_24h: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    circulating_supply: Option<String>,
    #[serde(default)]
    logo_url: Option<String>,
}

/// Deserialize a value that could be either a string or a number.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// HTTP client for the ranked listing feed.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
    listing_url: String,
}

impl ListingClient {
    /// Create a client with an explicit request timeout.
    pub fn new(listing_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            listing_url: listing_url.into(),
        })
    }
}

#[async_trait]
impl ItemSource for ListingClient {
    async fn fetch_items(&self, cycle_stamp: &str) -> Result<Vec<RawItem>> {
        let response = self.http.get(&self.listing_url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Listing(format!(
                "listing feed returned {}",
                response.status()
            )));
        }

        let rows: Vec<ListingRow> = response.json().await?;
        let items = items_from_rows(rows, cycle_stamp);
        info!("Scraped top {} cryptos.", items.len());
        Ok(items)
    }
}

/// Convert feed rows to raw items, enforcing the rank invariants.
///
/// Rows with a missing or unparseable rank are skipped; iteration stops
/// past the top-N bound; a rank already seen in this cycle is skipped.
fn items_from_rows(rows: Vec<ListingRow>, cycle_stamp: &str) -> Vec<RawItem> {
    let mut seen_ranks = HashSet::new();
    let mut items = Vec::new();

    for row in rows {
        let Some(rank) = row.rank.as_deref().and_then(|r| r.trim().parse::<u32>().ok()) else {
            continue;
        };
        if rank == 0 {
            continue;
        }
        if rank > TOP_N {
            break;
        }
        if !seen_ranks.insert(rank) {
            continue;
        }

        items.push(RawItem {
            rank,
            name: trimmed(row.name),
            symbol: trimmed(row.symbol),
            price: row.price,
            change_1h: Some(PercentField(row.change_1h, row.icon_1h)),
            change_24h: Some(PercentField(row.change_24h, row.icon_24h)),
            change_7d: Some(PercentField(row.change_7d, row.icon_7d)),
            market_cap: row.market_cap,
            volume_24h: row.volume_24h,
            circulating_supply: row.circulating_supply,
            logo_url: trimmed(row.logo_url),
            timestamp: Some(cycle_stamp.to_string()),
        });
    }

    items
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rank: &str) -> ListingRow {
        serde_json::from_value(serde_json::json!({
            "rank": rank,
            "name": " Bitcoin ",
            "symbol": "BTC",
            "price": "$42,123.50",
            "change_1h": "1.2%",
            "icon_1h": "icon-Caret-down",
        }))
        .unwrap()
    }

    #[test]
    fn test_rows_past_top_n_are_cut() {
        let mut rows: Vec<ListingRow> = (1..=12).map(|r| row(&r.to_string())).collect();
        rows.push(row("5"));

        let items = items_from_rows(rows, "2024-01-01T00:00:00+00:00");
        assert_eq!(items.len(), 10);
        assert_eq!(items.last().unwrap().rank, 10);
    }

    #[test]
    fn test_duplicate_and_unparseable_ranks_are_skipped() {
        let rows = vec![row("1"), row("x"), row("1"), row("2"), row("0")];

        let items = items_from_rows(rows, "2024-01-01T00:00:00+00:00");
        assert_eq!(
            items.iter().map(|i| i.rank).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_items_carry_the_cycle_stamp_and_trimmed_fields() {
        let items = items_from_rows(vec![row("1")], "2024-01-01T00:00:00+00:00");
        let item = &items[0];

        assert_eq!(item.timestamp.as_deref(), Some("2024-01-01T00:00:00+00:00"));
        assert_eq!(item.name.as_deref(), Some("Bitcoin"));
        assert_eq!(
            item.change_1h.as_ref().unwrap().icon(),
            Some("icon-Caret-down")
        );
    }

    #[test]
    fn test_numeric_rank_cells_are_accepted() {
        let row: ListingRow = serde_json::from_value(serde_json::json!({
            "rank": 3,
            "name": "Tether",
            "symbol": "USDT",
        }))
        .unwrap();

        let items = items_from_rows(vec![row], "2024-01-01T00:00:00+00:00");
        assert_eq!(items[0].rank, 3);
    }

    #[test]
    fn test_cycle_timestamp_truncates_to_the_minute() {
        let now = "2024-03-05T10:21:42.123456Z".parse().unwrap();
        assert_eq!(cycle_timestamp(now), "2024-03-05T10:21:00+00:00");
    }
}
