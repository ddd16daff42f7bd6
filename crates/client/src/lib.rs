//! Network access for offcache.
//!
//! This crate provides the [`Network`] seam the agent resolves requests
//! through, and the reqwest-backed [`FetchClient`] used in production.

pub mod fetch;
pub mod network;

pub use fetch::{FetchClient, FetchConfig};
pub use network::Network;
