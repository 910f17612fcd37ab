//! Scrape-and-buffer role.
//!
//! Fetches the ranked listing feed on a fixed cadence, buffers the raw
//! items, and publishes each full buffer to the broker as one batch
//! message. Holds no scrape position: every cycle starts clean, so the
//! process is restartable at any point.

pub mod buffer;
pub mod config;
pub mod error;
pub mod producer;
pub mod source;

pub use buffer::BatchBuffer;
pub use config::CollectorConfig;
pub use error::{Error, Result};
pub use producer::{BatchPublisher, PARTITION_KEY};
pub use source::{cycle_timestamp, ItemSource, ListingClient, TOP_N};
