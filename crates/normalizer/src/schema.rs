//! Raw and normalized item schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Percentage display text paired with an optional directional icon marker.
///
/// Serialized as a two-element JSON array (`["1.2%", "icon-Caret-down"]`)
/// to stay wire-compatible with the producer, which scrapes the text and
/// the icon class from adjacent table cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentField(pub Option<String>, pub Option<String>);

impl PercentField {
    pub fn new(text: impl Into<String>, icon: Option<&str>) -> Self {
        Self(Some(text.into()), icon.map(str::to_string))
    }

    /// Display text, e.g. `"1.2%"`.
    pub fn text(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Icon class fragment indicating direction, e.g. `"icon-Caret-down"`.
    pub fn icon(&self) -> Option<&str> {
        self.1.as_deref()
    }
}

/// One ranked asset as scraped, untrusted and loosely formatted.
///
/// `rank` is the only field the producer guarantees: positive, unique
/// within a scrape cycle, and bounded to the configured top-N. Everything
/// else may be absent or noisy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub rank: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Price with currency symbol and separators, e.g. `"$42,123.50"`.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub change_1h: Option<PercentField>,
    #[serde(default)]
    pub change_24h: Option<PercentField>,
    #[serde(default)]
    pub change_7d: Option<PercentField>,
    /// May carry a magnitude suffix, e.g. `"$800.5B"`.
    #[serde(default)]
    pub market_cap: Option<String>,
    #[serde(default)]
    pub volume_24h: Option<String>,
    #[serde(default)]
    pub circulating_supply: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    /// ISO-8601 scrape-cycle timestamp, fixed for every item of a cycle.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// The persisted item shape: typed numerics with correct sign.
///
/// Icon markers do not exist on this type; they are intermediate and are
/// never transmitted. `(name, symbol, scraped_at)` is the natural key in
/// the persistence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub name: String,
    pub symbol: String,
    pub scraped_at: DateTime<Utc>,
    /// Non-negative, `None` when the raw value was unparseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Signed percentage; sign derived from the icon marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_1h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_7d: Option<f64>,
    /// Magnitude suffixes are stripped, not expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulating_supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}
