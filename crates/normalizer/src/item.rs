//! Whole-item normalization.

use crate::clean::{adjust_percentage, clean_numeric};
use crate::schema::{NormalizedItem, PercentField, RawItem};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("item at rank {rank} is missing required field {field}")]
    MissingField { rank: u32, field: &'static str },
}

/// Normalize one raw item.
///
/// The six numeric-bearing string fields go through [`clean_numeric`]; the
/// three change pairs additionally pick up their sign from the icon marker
/// via [`adjust_percentage`]. `scraped_at` comes from the item's inherent
/// scrape-cycle timestamp, or `fallback` (ingestion time) when that is
/// absent or invalid. Name and symbol are required; an item without them
/// cannot be keyed and is rejected.
pub fn normalize_item(
    raw: &RawItem,
    fallback: DateTime<Utc>,
) -> Result<NormalizedItem, NormalizeError> {
    let name = required_text(raw.name.as_deref()).ok_or(NormalizeError::MissingField {
        rank: raw.rank,
        field: "name",
    })?;
    let symbol = required_text(raw.symbol.as_deref()).ok_or(NormalizeError::MissingField {
        rank: raw.rank,
        field: "symbol",
    })?;

    let scraped_at = raw
        .timestamp
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(fallback);

    Ok(NormalizedItem {
        name,
        symbol,
        scraped_at,
        price: clean_numeric(raw.price.as_deref()),
        change_1h: signed_change(raw.change_1h.as_ref()),
        change_24h: signed_change(raw.change_24h.as_ref()),
        change_7d: signed_change(raw.change_7d.as_ref()),
        market_cap: clean_numeric(raw.market_cap.as_deref()),
        volume_24h: clean_numeric(raw.volume_24h.as_deref()),
        circulating_supply: clean_numeric(raw.circulating_supply.as_deref()),
        rank: Some(raw.rank),
        logo_url: raw.logo_url.clone(),
    })
}

fn required_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn signed_change(field: Option<&PercentField>) -> Option<f64> {
    let magnitude = clean_numeric(field.and_then(PercentField::text));
    adjust_percentage(magnitude, field.and_then(PercentField::icon))
}
