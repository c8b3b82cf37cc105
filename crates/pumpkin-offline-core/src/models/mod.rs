//! Request and response types shared by the store, the network client and
//! the agent.

pub mod request;
pub mod response;

pub use request::{Method, Request, RequestKey};
pub use response::Response;
