use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::Method;
use crate::network::NetworkError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache '{0}' has not been opened")]
    UnknownCache(String),

    #[error("Invalid cache name: {0:?}")]
    InvalidName(String),

    #[error("Only GET requests can be cached, got {0}")]
    UnsupportedMethod(Method),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt cache entry {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

/// Why populating a store from a list of URLs failed.
#[derive(Error, Debug)]
pub enum AddAllError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("Fetching {url} returned {status}: {body}")]
    BadStatus {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to store {url}: {source}")]
    Store {
        url: String,
        #[source]
        source: CacheError,
    },
}
