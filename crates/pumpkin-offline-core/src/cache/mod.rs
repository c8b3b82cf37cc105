//! Persistent response store for offline access.
//!
//! Responses live in named stores (the agent writes into `v1`). Each store
//! maps a request identity (method + URL) to the most recent response for
//! it. Writes overwrite; nothing is ever evicted or expired.
//!
//! Backends:
//! - `MemoryStorage`: process-local, used by tests
//! - `DiskStorage`: one directory per store under a cache root

pub mod disk;
pub mod error;
pub mod memory;
pub mod named;
pub mod storage;

pub use disk::DiskStorage;
pub use error::{AddAllError, CacheError};
pub use memory::MemoryStorage;
pub use named::{Caches, NamedCache};
pub use storage::{CacheStorage, CachedEntry};
