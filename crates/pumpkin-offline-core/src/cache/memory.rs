//! In-process store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::RequestKey;

use super::{CacheError, CacheStorage, CachedEntry};

struct Store {
    name: String,
    entries: HashMap<RequestKey, CachedEntry>,
}

/// Keeps every store in memory. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStorage {
    // Vec keeps stores in creation order for match_any
    stores: RwLock<Vec<Store>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, cache_name: &str) -> Result<(), CacheError> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|s| s.name == cache_name) {
            stores.push(Store {
                name: cache_name.to_string(),
                entries: HashMap::new(),
            });
        }
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let stores = self.stores.read().await;
        Ok(stores.iter().map(|s| s.name.clone()).collect())
    }

    async fn put(&self, cache_name: &str, entry: CachedEntry) -> Result<(), CacheError> {
        let mut stores = self.stores.write().await;
        let store = stores
            .iter_mut()
            .find(|s| s.name == cache_name)
            .ok_or_else(|| CacheError::UnknownCache(cache_name.to_string()))?;
        store.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn get(
        &self,
        cache_name: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedEntry>, CacheError> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == cache_name)
            .and_then(|s| s.entries.get(key).cloned()))
    }

    async fn entries(&self, cache_name: &str) -> Result<Vec<CachedEntry>, CacheError> {
        let stores = self.stores.read().await;
        let store = stores
            .iter()
            .find(|s| s.name == cache_name)
            .ok_or_else(|| CacheError::UnknownCache(cache_name.to_string()))?;
        let mut entries: Vec<CachedEntry> = store.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.cached_at);
        Ok(entries)
    }
}
