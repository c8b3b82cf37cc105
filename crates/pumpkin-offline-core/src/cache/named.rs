//! Handles over a `CacheStorage` shaped like the browser's cache API:
//! `Caches` is the store-wide entry point, `NamedCache` one opened store.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;
use url::Url;

use crate::models::{Method, Request, RequestKey, Response};
use crate::network::error::truncate_body;
use crate::network::Fetch;

use super::{AddAllError, CacheError, CacheStorage, CachedEntry};

/// Maximum concurrent fetches while populating a store.
/// The manifest is mostly small sprites, 8 keeps the origin comfortable.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Entry point to every named store in a backend.
/// Clone is cheap - the backend is shared behind an Arc.
#[derive(Clone)]
pub struct Caches {
    storage: Arc<dyn CacheStorage>,
}

impl Caches {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Open a store by name, creating it if absent.
    pub async fn open(&self, name: &str) -> Result<NamedCache, CacheError> {
        self.storage.open(name).await?;
        Ok(NamedCache {
            storage: Arc::clone(&self.storage),
            name: name.to_string(),
        })
    }

    /// Look a request up in every store, whatever its name.
    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        Ok(self.storage.match_any(key).await?.map(|e| e.response))
    }

    pub async fn names(&self) -> Result<Vec<String>, CacheError> {
        self.storage.cache_names().await
    }
}

/// One opened store.
#[derive(Clone)]
pub struct NamedCache {
    storage: Arc<dyn CacheStorage>,
    name: String,
}

impl NamedCache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a response under the key, replacing any earlier one.
    /// Only GET requests are cacheable.
    pub async fn put(&self, key: &RequestKey, response: Response) -> Result<(), CacheError> {
        if key.method != Method::Get {
            return Err(CacheError::UnsupportedMethod(key.method));
        }
        self.storage
            .put(&self.name, CachedEntry::new(key.clone(), response))
            .await
    }

    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, CacheError> {
        Ok(self.storage.get(&self.name, key).await?.map(|e| e.response))
    }

    pub async fn entries(&self) -> Result<Vec<CachedEntry>, CacheError> {
        self.storage.entries(&self.name).await
    }

    /// Fetch every URL and store the responses.
    ///
    /// All-or-nothing with respect to the network: a transport failure or a
    /// non-success status on any URL fails the whole call before anything is
    /// written. Returns the number of entries stored.
    pub async fn add_all(&self, fetcher: &dyn Fetch, urls: &[Url]) -> Result<usize, AddAllError> {
        let fetched: Vec<(Request, Response)> = stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let request = Request::get(url);
                let response = fetcher
                    .fetch(&request)
                    .await
                    .map_err(|source| AddAllError::Fetch {
                        url: request.url.to_string(),
                        source,
                    })?;
                if !response.is_success() {
                    return Err(AddAllError::BadStatus {
                        url: request.url.to_string(),
                        status: response.status,
                        body: truncate_body(&response.body),
                    });
                }
                Ok::<_, AddAllError>((request, response))
            })
            .buffered(MAX_CONCURRENT_FETCHES)
            .try_collect()
            .await?;

        let count = fetched.len();
        for (request, response) in fetched {
            self.put(&request.key(), response)
                .await
                .map_err(|source| AddAllError::Store {
                    url: request.url.to_string(),
                    source,
                })?;
        }
        debug!(cache = %self.name, count, "Stored fetched responses");
        Ok(count)
    }
}
