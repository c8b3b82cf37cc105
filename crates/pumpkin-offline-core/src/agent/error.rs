use thiserror::Error;

use crate::cache::{AddAllError, CacheError};

/// Why an install (precache) attempt failed. The agent stays uninstalled.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Invalid asset URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to open cache: {0}")]
    Open(#[from] CacheError),

    #[error("Failed to precache assets: {0}")]
    Populate(#[from] AddAllError),
}
