//! Network access for the offline agent.
//!
//! `Fetch` is the seam between the agent and the network: `HttpFetcher`
//! talks to the game's origin with reqwest, tests substitute fakes.
//!
//! An HTTP error status is still a successful fetch. Only transport
//! failures (refused connection, DNS, timeout) are `NetworkError`s.

pub mod client;
pub mod error;

pub use client::{Fetch, HttpFetcher};
pub use error::NetworkError;
