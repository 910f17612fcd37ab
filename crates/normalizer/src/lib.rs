//! Normalization of raw scraped listing records into typed items.
//!
//! The scraper is an untrusted, free-form producer: prices carry currency
//! symbols and thousands separators, large numbers carry magnitude
//! suffixes, and percentage changes arrive as display text paired with a
//! directional icon marker. This crate turns that noise into typed numeric
//! values with correct sign.
//!
//! ```text
//! RawItem (strings, icon markers) --> normalize_item --> NormalizedItem (f64, signed)
//! ```
//!
//! Malformed field values never fail normalization; they become `None`.

pub mod clean;
pub mod item;
pub mod schema;

pub use clean::{adjust_percentage, clean_numeric};
pub use item::{normalize_item, NormalizeError};
pub use schema::{NormalizedItem, PercentField, RawItem};
