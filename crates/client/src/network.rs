//! The network seam.
//!
//! The agent only ever talks to the network through [`Network`], so tests
//! and alternative transports can stand in for [`crate::FetchClient`].

use offcache_core::{Error, Request, Response};

/// A transport that performs live fetches.
///
/// Any HTTP status (including 4xx/5xx) is a successful fetch and comes back
/// as `Ok`. `Err` means the request was rejected before a response arrived:
/// DNS failure, refused connection, timeout, or an oversized body.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[async_trait::async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        (**self).fetch(request).await
    }
}
