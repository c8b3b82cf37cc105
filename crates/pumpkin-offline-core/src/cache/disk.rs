//! Filesystem store backend.
//!
//! Layout under the cache root:
//! - `index.json`: store names in the order they were first opened
//! - `<store>/<sha256 of "METHOD url">.entry`: one file per cached response
//!
//! An entry file is a single line of JSON metadata followed by the raw body.
//! Entries are written to a temporary file and renamed into place, so a
//! concurrent reader sees the old entry or the new one. A crash between the
//! write and the rename leaves a `*.tmp-*` file behind; those are swept when
//! the storage is created, once they are older than any live write could be.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{Method, RequestKey, Response};

use super::{CacheError, CacheStorage, CachedEntry};

const INDEX_FILE: &str = "index.json";
const ENTRY_EXTENSION: &str = "entry";
const TMP_MARKER: &str = ".tmp-";

/// Temp files untouched for this long belong to a writer that died.
const STALE_TMP_AGE: Duration = Duration::from_secs(10 * 60);

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    method: Method,
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    cached_at: DateTime<Utc>,
}

pub struct DiskStorage {
    root: PathBuf,
    // Serializes read-modify-write of the index
    index_lock: Mutex<()>,
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&root)?;
        let swept = sweep_stale_temp_files(&root, STALE_TMP_AGE)?;
        if swept > 0 {
            debug!(root = %root.display(), swept, "Removed leftover temp files");
        }
        Ok(Self {
            root,
            index_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, cache_name: &str) -> Result<PathBuf, CacheError> {
        let valid = !cache_name.is_empty()
            && cache_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheError::InvalidName(cache_name.to_string()));
        }
        Ok(self.root.join(cache_name))
    }

    fn entry_path(&self, cache_name: &str, key: &RequestKey) -> Result<PathBuf, CacheError> {
        let digest = Sha256::digest(key.to_string().as_bytes());
        Ok(self
            .store_dir(cache_name)?
            .join(format!("{}.{}", hex::encode(digest), ENTRY_EXTENSION)))
    }

    async fn read_index(&self) -> Result<Vec<String>, CacheError> {
        match fs::read(self.root.join(INDEX_FILE)).await {
            Ok(contents) => Ok(serde_json::from_slice(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("tmp-{}-{}", std::process::id(), n));
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn encode(entry: &CachedEntry) -> Result<Vec<u8>, CacheError> {
        let header = EntryHeader {
            method: entry.key.method,
            url: entry.key.url.clone(),
            status: entry.response.status.as_u16(),
            headers: entry.response.headers.clone(),
            cached_at: entry.cached_at,
        };
        // serde_json escapes newlines inside strings, so the header is one line
        let mut contents = serde_json::to_vec(&header)?;
        contents.push(b'\n');
        contents.extend_from_slice(&entry.response.body);
        Ok(contents)
    }

    fn decode(path: &Path, contents: Vec<u8>) -> Result<CachedEntry, CacheError> {
        let corrupt = |reason: String| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let split = contents
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| corrupt("missing header line".to_string()))?;
        let header: EntryHeader = serde_json::from_slice(&contents[..split])
            .map_err(|e| corrupt(e.to_string()))?;
        let status = StatusCode::from_u16(header.status)
            .map_err(|_| corrupt(format!("invalid status {}", header.status)))?;

        let body = Bytes::from(contents).slice(split + 1..);
        Ok(CachedEntry {
            key: RequestKey {
                method: header.method,
                url: header.url,
            },
            response: Response {
                status,
                headers: header.headers,
                body,
            },
            cached_at: header.cached_at,
        })
    }

    async fn read_entry(path: &Path) -> Result<Option<CachedEntry>, CacheError> {
        match fs::read(path).await {
            Ok(contents) => Self::decode(path, contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Remove temp files older than `max_age` from the root and every store
/// directory. Returns how many were removed.
fn sweep_stale_temp_files(root: &Path, max_age: Duration) -> Result<usize, CacheError> {
    let now = SystemTime::now();
    let mut dirs = vec![root.to_path_buf()];
    let mut removed = 0;

    while let Some(dir) = dirs.pop() {
        for dirent in std::fs::read_dir(&dir)? {
            let dirent = dirent?;
            let path = dirent.path();
            let metadata = dirent.metadata()?;
            if metadata.is_dir() {
                if dir.as_path() == root {
                    dirs.push(path);
                }
                continue;
            }
            let is_tmp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(TMP_MARKER));
            let age = metadata
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if is_tmp && age >= max_age {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale temp file"),
                }
            }
        }
    }
    Ok(removed)
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, cache_name: &str) -> Result<(), CacheError> {
        let dir = self.store_dir(cache_name)?;
        let _guard = self.index_lock.lock().await;

        fs::create_dir_all(&dir).await?;
        let mut names = self.read_index().await?;
        if !names.iter().any(|n| n == cache_name) {
            names.push(cache_name.to_string());
            let contents = serde_json::to_vec_pretty(&names)?;
            Self::write_atomic(&self.root.join(INDEX_FILE), &contents).await?;
            debug!(cache = cache_name, root = %self.root.display(), "Created cache store");
        }
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        self.read_index().await
    }

    async fn put(&self, cache_name: &str, entry: CachedEntry) -> Result<(), CacheError> {
        if !fs::try_exists(self.store_dir(cache_name)?).await? {
            return Err(CacheError::UnknownCache(cache_name.to_string()));
        }
        let path = self.entry_path(cache_name, &entry.key)?;
        Self::write_atomic(&path, &Self::encode(&entry)?).await
    }

    async fn get(
        &self,
        cache_name: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedEntry>, CacheError> {
        let path = self.entry_path(cache_name, key)?;
        let Some(entry) = Self::read_entry(&path).await? else {
            return Ok(None);
        };
        // Guard against a digest collision handing back someone else's entry
        if &entry.key != key {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn entries(&self, cache_name: &str) -> Result<Vec<CachedEntry>, CacheError> {
        let dir = self.store_dir(cache_name)?;
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::UnknownCache(cache_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(dirent) = read_dir.next_entry().await? {
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry"),
            }
        }
        entries.sort_by_key(|e| e.cached_at);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse(&format!("http://localhost:8080{}", path)).unwrap())
    }

    fn entry(path: &str, body: &'static [u8]) -> CachedEntry {
        CachedEntry::new(
            key(path),
            Response::new(
                StatusCode::OK,
                vec![("Content-Type".to_string(), "image/png".to_string())],
                Bytes::from_static(body),
            ),
        )
    }

    #[tokio::test]
    async fn test_put_then_get_preserves_binary_body() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("v1").await.unwrap();

        // Body with newlines and non-utf8 bytes
        let stored = entry("/assets/bat@32.png", b"\x89PNG\r\n\x1a\n\x00\xff");
        storage.put("v1", stored.clone()).await.unwrap();

        let got = storage.get("v1", &key("/assets/bat@32.png")).await.unwrap().unwrap();
        assert_eq!(got, stored);
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
            storage.open("v1").await.unwrap();
            storage.put("v1", entry("/index.html", b"<html>")).await.unwrap();
        }

        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(storage.cache_names().await.unwrap(), vec!["v1"]);
        let got = storage.match_any(&key("/index.html")).await.unwrap().unwrap();
        assert_eq!(&got.response.body[..], b"<html>");
    }

    #[tokio::test]
    async fn test_put_into_unopened_store_fails() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        let err = storage.put("v1", entry("/a", b"a")).await.unwrap_err();
        assert!(matches!(err, CacheError::UnknownCache(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        for name in ["", "..", "a/b", "v1.json"] {
            assert!(matches!(
                storage.open(name).await,
                Err(CacheError::InvalidName(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_entries_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("v1").await.unwrap();
        storage.put("v1", entry("/a", b"a")).await.unwrap();
        storage.put("v1", entry("/b", b"b")).await.unwrap();
        std::fs::write(dir.path().join("v1").join("garbage.entry"), b"no header").unwrap();

        let entries = storage.entries("v1").await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_new_sweeps_stale_temp_files_only() {
        let dir = TempDir::new().unwrap();
        {
            let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
            storage.open("v1").await.unwrap();
            storage.put("v1", entry("/a", b"a")).await.unwrap();
        }
        let store = dir.path().join("v1");
        let stale = store.join("abc.tmp-999-0");
        let fresh = store.join("def.tmp-999-1");
        let stale_index = dir.path().join("index.tmp-999-2");
        for path in [&stale, &fresh, &stale_index] {
            std::fs::write(path, b"partial").unwrap();
        }
        let old = SystemTime::now() - Duration::from_secs(3600);
        for path in [&stale, &stale_index] {
            let file = std::fs::File::options().write(true).open(path).unwrap();
            file.set_modified(old).unwrap();
        }

        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(!stale.exists());
        assert!(!stale_index.exists());
        assert!(fresh.exists());
        assert!(storage.get("v1", &key("/a")).await.unwrap().is_some());
        assert_eq!(storage.cache_names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_and_gets_never_tear() {
        const WRITERS: usize = 32;
        const BODY_LEN: usize = 100 * 1024;

        let dir = TempDir::new().unwrap();
        let storage = Arc::new(DiskStorage::new(dir.path().to_path_buf()).unwrap());
        storage.open("v1").await.unwrap();
        let target = key("/bin/pumpkin-game_opt.wasm");

        let mut tasks = Vec::new();
        for i in 0..WRITERS {
            let writer_storage = Arc::clone(&storage);
            let writer_target = target.clone();
            tasks.push(tokio::spawn(async move {
                // Every writer stores a body made of one repeated byte
                let body = Bytes::from(vec![b'a' + (i % 26) as u8; BODY_LEN]);
                let response = Response::new(StatusCode::OK, vec![], body);
                writer_storage
                    .put("v1", CachedEntry::new(writer_target, response))
                    .await
                    .unwrap();
            }));

            let reader_storage = Arc::clone(&storage);
            let reader_target = target.clone();
            tasks.push(tokio::spawn(async move {
                if let Some(entry) = reader_storage.get("v1", &reader_target).await.unwrap() {
                    let body = &entry.response.body;
                    assert_eq!(body.len(), BODY_LEN);
                    assert!(body.iter().all(|&b| b == body[0]), "torn read");
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let files: Vec<_> = std::fs::read_dir(dir.path().join("v1"))
            .unwrap()
            .map(|d| d.unwrap().file_name())
            .collect();
        assert_eq!(files.len(), 1, "leftover files: {:?}", files);
        assert_eq!(storage.entries("v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error_on_get() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().to_path_buf()).unwrap();
        storage.open("v1").await.unwrap();
        let path = storage.entry_path("v1", &key("/a")).unwrap();
        std::fs::write(&path, b"{not json}\nbody").unwrap();

        assert!(matches!(
            storage.get("v1", &key("/a")).await,
            Err(CacheError::Corrupt { .. })
        ));
    }
}
