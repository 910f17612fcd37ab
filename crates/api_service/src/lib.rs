//! Persistence API service.
//!
//! Accepts normalized crypto items and operational log events over HTTP
//! and stores them with a uniqueness constraint on the item natural key
//! (name, symbol, scraped_at).

pub mod api;
pub mod error;
pub mod store;

pub use api::{create_router, AppState};
pub use error::{Error, Result};
pub use store::{CryptoStore, LogStore};
