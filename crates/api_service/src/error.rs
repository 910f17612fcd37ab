//! Error types for the API service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate crypto item for key {0}")]
    DuplicateItem(String),
}

pub type Result<T> = std::result::Result<T, Error>;
