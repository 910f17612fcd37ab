//! Error types for the collector.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing feed error: {0}")]
    Listing(String),
}

pub type Result<T> = std::result::Result<T, Error>;
