//! Core library for pumpkin-offline.
//!
//! The pumpkin game runs entirely in the browser and must keep working
//! without a network. This crate holds the offline agent that makes that
//! possible:
//! - `manifest`: the fixed list of assets the game needs offline
//! - `cache`: the named response store, in memory or on disk
//! - `network`: fetching requests from the game's origin
//! - `agent`: the precache loader and the request interceptor

pub mod agent;
pub mod cache;
pub mod manifest;
pub mod models;
pub mod network;

pub use agent::{Agent, InstallError, Intercepted, Outcome};
pub use cache::{CacheStorage, Caches, DiskStorage, MemoryStorage, NamedCache};
pub use models::{Method, Request, RequestKey, Response};
pub use network::{Fetch, HttpFetcher, NetworkError};

#[cfg(test)]
pub(crate) mod testing;
