//! Cache-first request handling with a fallback chain.
//!
//! For each request, first match wins:
//! 1. any store has the request: serve it, no network
//! 2. the network answers: serve that, store a copy in the background
//! 3. the network fails and the fallback asset is stored: serve the fallback
//! 4. otherwise: serve a synthesized 408 plain-text response

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheError, Caches};
use crate::models::{Request, RequestKey, Response};
use crate::network::Fetch;

/// Which branch produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CacheHit,
    NetworkOk,
    FallbackHit,
    Synthesized,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::CacheHit => "cache-hit",
            Outcome::NetworkOk => "network",
            Outcome::FallbackHit => "fallback",
            Outcome::Synthesized => "synthesized",
        }
    }
}

/// The answer to one intercepted request.
#[derive(Debug)]
pub struct Intercepted {
    pub outcome: Outcome,
    pub response: Response,
    /// Background store write started for `NetworkOk`. Dropping the handle
    /// detaches the task; the write still runs to completion.
    pub store_write: Option<JoinHandle<()>>,
}

impl Intercepted {
    fn served(outcome: Outcome, response: Response) -> Self {
        Self {
            outcome,
            response,
            store_write: None,
        }
    }
}

#[derive(Clone)]
pub struct RequestInterceptor {
    caches: Caches,
    fetcher: Arc<dyn Fetch>,
    cache_name: String,
    fallback: RequestKey,
}

impl RequestInterceptor {
    pub fn new(caches: Caches, fetcher: Arc<dyn Fetch>, cache_name: &str, fallback_url: &Url) -> Self {
        Self {
            caches,
            fetcher,
            cache_name: cache_name.to_string(),
            fallback: RequestKey::get(fallback_url),
        }
    }

    /// Produce a response for the request. Never fails.
    ///
    /// Must be called within a tokio runtime: the store write after a
    /// network fetch is spawned.
    pub async fn handle(&self, request: &Request) -> Intercepted {
        let key = request.key();

        if let Some(response) = self.lookup(&key).await {
            debug!(request = %key, "Served from cache");
            return Intercepted::served(Outcome::CacheHit, response);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                debug!(request = %key, status = response.status.as_u16(), "Served from network");
                // Bytes bodies are shareable, so this clone is the copy the
                // store keeps while the caller reads the original.
                let store_write = self.store_in_background(key, response.clone());
                Intercepted {
                    outcome: Outcome::NetworkOk,
                    response,
                    store_write: Some(store_write),
                }
            }
            Err(e) => {
                debug!(request = %key, error = %e, "Network failed, trying fallback");
                match self.lookup(&self.fallback).await {
                    Some(response) => Intercepted::served(Outcome::FallbackHit, response),
                    None => {
                        warn!(request = %key, "No cache, network or fallback; synthesizing error response");
                        Intercepted::served(Outcome::Synthesized, Response::network_error())
                    }
                }
            }
        }
    }

    /// Store-wide lookup; a failing store counts as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.caches.match_request(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(request = %key, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn store_in_background(&self, key: RequestKey, response: Response) -> JoinHandle<()> {
        let caches = self.caches.clone();
        let cache_name = self.cache_name.clone();
        tokio::spawn(async move {
            if let Err(e) = put_in_cache(&caches, &cache_name, &key, response).await {
                warn!(request = %key, error = %e, "Failed to cache network response");
            }
        })
    }
}

async fn put_in_cache(
    caches: &Caches,
    cache_name: &str,
    key: &RequestKey,
    response: Response,
) -> Result<(), CacheError> {
    caches.open(cache_name).await?.put(key, response).await
}
