//! Host-facing agent: wires the loader and the interceptor to one scope.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::cache::Caches;
use crate::manifest;
use crate::models::Request;
use crate::network::Fetch;

use super::{InstallError, Intercepted, PrecacheLoader, RequestInterceptor};

pub struct Agent {
    scope: Url,
    caches: Caches,
    loader: PrecacheLoader,
    interceptor: RequestInterceptor,
    installed: AtomicBool,
}

impl Agent {
    /// Agent for the game served under `scope`, precaching the asset manifest.
    pub fn new(caches: Caches, fetcher: Arc<dyn Fetch>, scope: Url) -> Result<Self, InstallError> {
        let scope = normalize_scope(scope);
        let loader = PrecacheLoader::from_manifest(caches.clone(), Arc::clone(&fetcher), &scope)?;
        let fallback = manifest::fallback_url(&scope)?;
        let interceptor =
            RequestInterceptor::new(caches.clone(), fetcher, manifest::CACHE_NAME, &fallback);

        Ok(Self {
            scope,
            caches,
            loader,
            interceptor,
            installed: AtomicBool::new(false),
        })
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Install event. Resolves once every asset is stored; on error the
    /// agent stays uninstalled and the host may call this again.
    pub async fn on_install(&self) -> Result<usize, InstallError> {
        match self.loader.run().await {
            Ok(count) => {
                self.installed.store(true, Ordering::SeqCst);
                Ok(count)
            }
            Err(e) => {
                warn!(scope = %self.scope, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    /// Fetch event. Always yields a response.
    pub async fn on_fetch(&self, request: &Request) -> Intercepted {
        self.interceptor.handle(request).await
    }

    /// Resolve a path the way the page would, relative to the scope.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.scope.join(path)
    }
}

/// `./` paths only land inside the scope when it ends in a slash.
fn normalize_scope(mut scope: Url) -> Url {
    if !scope.path().ends_with('/') {
        let path = format!("{}/", scope.path());
        scope.set_path(&path);
    }
    scope
}
