use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::cache::Caches;
use crate::manifest;
use crate::network::Fetch;

use super::InstallError;

/// Populates the agent's store with every asset the game needs offline.
#[derive(Clone)]
pub struct PrecacheLoader {
    caches: Caches,
    fetcher: Arc<dyn Fetch>,
    cache_name: String,
    urls: Vec<Url>,
}

impl PrecacheLoader {
    pub fn new(caches: Caches, fetcher: Arc<dyn Fetch>, cache_name: &str, urls: Vec<Url>) -> Self {
        Self {
            caches,
            fetcher,
            cache_name: cache_name.to_string(),
            urls,
        }
    }

    /// Loader for the game's asset manifest within `scope`.
    pub fn from_manifest(
        caches: Caches,
        fetcher: Arc<dyn Fetch>,
        scope: &Url,
    ) -> Result<Self, InstallError> {
        let urls = manifest::resolve_all(scope, manifest::ASSET_MANIFEST.iter().copied())?;
        Ok(Self::new(caches, fetcher, manifest::CACHE_NAME, urls))
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    /// Open the store and fill it. Fails if any asset cannot be fetched.
    pub async fn run(&self) -> Result<usize, InstallError> {
        let cache = self.caches.open(&self.cache_name).await?;
        let count = cache.add_all(self.fetcher.as_ref(), &self.urls).await?;
        info!(cache = %self.cache_name, count, "Precached assets");
        Ok(count)
    }
}
