//! Request-identity cache keys.

use sha2::{Digest, Sha256};

use crate::http::Request;

/// Compute the cache key for a method and normalized URL.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for a request; the query string is part of the identity.
pub fn request_key(request: &Request) -> String {
    compute_cache_key(&request.method, request.url.as_str())
}
