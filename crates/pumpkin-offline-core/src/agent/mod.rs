//! The offline agent.
//!
//! The agent reacts to two lifecycle events from its host:
//! - install: `PrecacheLoader` stores every manifest asset in the `v1` store
//! - fetch: `RequestInterceptor` answers a request from the store, the
//!   network, or the fallback asset, and never fails
//!
//! `Agent` bundles both behind the host-facing `on_install`/`on_fetch`.

pub mod error;
pub mod interceptor;
pub mod lifecycle;
pub mod precache;

pub use error::InstallError;
pub use interceptor::{Intercepted, Outcome, RequestInterceptor};
pub use lifecycle::Agent;
pub use precache::PrecacheLoader;
