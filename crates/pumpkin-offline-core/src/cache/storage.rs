use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{RequestKey, Response};

use super::CacheError;

/// A stored response together with when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub key: RequestKey,
    pub response: Response,
    pub cached_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn new(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            response,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Trait for store backends.
///
/// Backends hold any number of named stores. Concurrent writes to the same
/// key are last-writer-wins; a reader sees either the old or the new entry,
/// never a mix.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named store if it does not exist yet.
    async fn open(&self, cache_name: &str) -> Result<(), CacheError>;

    /// Store names in the order they were first opened.
    async fn cache_names(&self) -> Result<Vec<String>, CacheError>;

    /// Write a response, replacing any previous entry for the key.
    async fn put(&self, cache_name: &str, entry: CachedEntry) -> Result<(), CacheError>;

    async fn get(&self, cache_name: &str, key: &RequestKey)
        -> Result<Option<CachedEntry>, CacheError>;

    /// All entries of one store, oldest first.
    async fn entries(&self, cache_name: &str) -> Result<Vec<CachedEntry>, CacheError>;

    /// Look the key up in every store, oldest store first.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedEntry>, CacheError> {
        for name in self.cache_names().await? {
            if let Some(entry) = self.get(&name, key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use reqwest::StatusCode;
    use url::Url;

    fn entry() -> CachedEntry {
        let url = Url::parse("http://localhost:8080/index.html").unwrap();
        CachedEntry::new(
            RequestKey::get(&url),
            Response::new(StatusCode::OK, vec![], "hi"),
        )
    }

    #[test]
    fn test_age_display_just_now() {
        assert_eq!(entry().age_display(), "just now");
    }

    #[test]
    fn test_age_display_rounding() {
        let mut e = entry();
        e.cached_at = Utc::now() - Duration::minutes(15);
        assert_eq!(e.age_display(), "15m ago");

        e.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(e.age_display(), "2h ago");

        e.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(e.age_display(), "1d ago");
    }

    #[test]
    fn test_age_display_future_timestamp() {
        let mut e = entry();
        e.cached_at = Utc::now() + Duration::minutes(10);
        assert_eq!(e.age_display(), "just now");
    }
}
