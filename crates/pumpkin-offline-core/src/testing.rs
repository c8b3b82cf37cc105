//! Test doubles shared by unit tests across the crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::manifest;
use crate::models::{Request, Response};
use crate::network::{Fetch, NetworkError};

/// An in-memory origin server that counts requests and can be switched off.
pub(crate) struct FakeOrigin {
    responses: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Origin serving every manifest asset; each body is the asset's path.
    pub fn serving_manifest(scope: &Url) -> Self {
        let origin = Self::new();
        for path in manifest::ASSET_MANIFEST {
            let url = scope.join(path).unwrap();
            let content_type = match path.rsplit('.').next() {
                Some("png") => "image/png",
                Some("ogg") => "audio/ogg",
                Some("wasm") => "application/wasm",
                Some("js") => "text/javascript",
                Some("ttf") => "font/ttf",
                _ => "text/html",
            };
            origin.serve(
                &url,
                Response::new(
                    StatusCode::OK,
                    vec![("Content-Type".to_string(), content_type.to_string())],
                    path.to_string(),
                ),
            );
        }
        origin
    }

    pub fn serve(&self, url: &Url, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn remove(&self, url: &Url) {
        self.responses.lock().unwrap().remove(url.as_str());
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for FakeOrigin {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable(request.url.to_string()));
        }
        let response = self.responses.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(response.unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, vec![], "Not Found")))
    }
}
