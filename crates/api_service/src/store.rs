//! In-memory persistence using DashMap.
//!
//! The crypto store enforces the natural-key uniqueness constraint
//! (name, symbol, scraped_at); that constraint is the sole concurrency
//! invariant shared by the stateless request handlers.

use crate::error::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use common::LogEvent;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use normalizer::schema::NormalizedItem;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stored crypto item with its assigned id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredCryptoItem {
    pub id: u64,
    #[serde(flatten)]
    pub item: NormalizedItem,
}

/// Stored log event with its assigned id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredLogEvent {
    pub id: u64,
    #[serde(flatten)]
    pub event: LogEvent,
}

/// Concurrent store for normalized items keyed by the natural key.
#[derive(Debug, Clone, Default)]
pub struct CryptoStore {
    inner: Arc<CryptoStoreInner>,
}

#[derive(Debug, Default)]
struct CryptoStoreInner {
    items: DashMap<String, StoredCryptoItem>,
    next_id: AtomicU64,
}

impl CryptoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, rejecting a second record for the same natural key.
    pub fn insert(&self, item: NormalizedItem) -> Result<StoredCryptoItem, Error> {
        let key = natural_key(&item.name, &item.symbol, item.scraped_at);

        match self.inner.items.entry(key.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateItem(key)),
            Entry::Vacant(slot) => {
                let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let stored = StoredCryptoItem { id, item };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.is_empty()
    }
}

fn natural_key(name: &str, symbol: &str, scraped_at: DateTime<Utc>) -> String {
    format!(
        "{}:{}:{}",
        name,
        symbol,
        scraped_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

/// Append-only concurrent store for log events.
#[derive(Debug, Clone, Default)]
pub struct LogStore {
    inner: Arc<LogStoreInner>,
}

#[derive(Debug, Default)]
struct LogStoreInner {
    events: DashMap<u64, StoredLogEvent>,
    next_id: AtomicU64,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: LogEvent) -> StoredLogEvent {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = StoredLogEvent { id, event };
        self.inner.events.insert(id, stored.clone());
        stored
    }

    pub fn len(&self) -> usize {
        self.inner.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Issuer;

    fn item(name: &str, scraped_at: &str) -> NormalizedItem {
        NormalizedItem {
            name: name.to_string(),
            symbol: name.to_string(),
            scraped_at: scraped_at.parse().unwrap(),
            price: Some(1.0),
            change_1h: None,
            change_24h: None,
            change_7d: None,
            market_cap: None,
            volume_24h: None,
            circulating_supply: None,
            rank: None,
            logo_url: None,
        }
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = CryptoStore::new();
        let first = store.insert(item("BTC", "2024-01-01T00:00:00Z")).unwrap();
        let second = store.insert(item("ETH", "2024-01-01T00:00:00Z")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_natural_key_is_rejected() {
        let store = CryptoStore::new();
        store.insert(item("BTC", "2024-01-01T00:00:00Z")).unwrap();

        let err = store
            .insert(item("BTC", "2024-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateItem(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_asset_different_cycle_is_accepted() {
        let store = CryptoStore::new();
        store.insert(item("BTC", "2024-01-01T00:00:00Z")).unwrap();
        store.insert(item("BTC", "2024-01-01T00:01:00Z")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_log_store_appends() {
        let store = LogStore::new();
        let stored = store.append(LogEvent::error(Issuer::Api, "boom"));
        assert_eq!(stored.id, 1);
        assert_eq!(store.len(), 1);
    }
}
