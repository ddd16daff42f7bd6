//! Request and response snapshots exchanged between the agent, the network
//! and the cache store.
//!
//! Bodies are held as [`Bytes`], so duplicating a response for the caller
//! and the cache is a reference-count bump rather than a second read.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Status text of the synthesized offline response.
pub const OFFLINE_STATUS_TEXT: &str = "Service Unavailable";

/// Body of the synthesized offline response.
pub const OFFLINE_BODY: &str = "Offline - No cached version available";

/// An outgoing request from a controlled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Upper-cased HTTP method.
    pub method: String,
    /// Request URL with the fragment removed.
    pub url: Url,
    /// Request headers in arrival order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Build a request, normalizing the method and URL.
    ///
    /// The URL keeps its query string; only the fragment is dropped, since
    /// it never reaches the network.
    pub fn new(method: &str, url: &str) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() {
            return Err(Error::InvalidInput("method cannot be empty".into()));
        }

        let mut url = Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        url.set_fragment(None);

        Ok(Self { method: method.to_ascii_uppercase(), url, headers: Vec::new() })
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new("GET", url)
    }

    /// `GET` request for an already-parsed URL.
    pub fn get_url(mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method: "GET".into(), url, headers: Vec::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Whether the URL uses a scheme the network layer can serve.
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }
}

/// Response type, following the Fetch standard's classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Basic,
    Cors,
    Default,
    Opaque,
    OpaqueRedirect,
    Error,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Default => "default",
            ResponseType::Opaque => "opaque",
            ResponseType::OpaqueRedirect => "opaqueredirect",
            ResponseType::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(ResponseType::Basic),
            "cors" => Some(ResponseType::Cors),
            "default" => Some(ResponseType::Default),
            "opaque" => Some(ResponseType::Opaque),
            "opaqueredirect" => Some(ResponseType::OpaqueRedirect),
            "error" => Some(ResponseType::Error),
            _ => None,
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    #[serde(default)]
    pub response_type: ResponseType,
}

impl Response {
    /// A basic response with the given status and body.
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
        }
    }

    /// Plain 200 response, mostly useful for tests and fixtures.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, "OK", body)
    }

    /// The response returned when neither cache nor network can answer.
    pub fn offline_fallback() -> Self {
        Self::new(503, OFFLINE_STATUS_TEXT, OFFLINE_BODY).with_header("Content-Type", "text/plain")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether a fetched response may be written to the cache.
    ///
    /// Only an exact 200 that is not an error-type response qualifies.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type != ResponseType::Error
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
