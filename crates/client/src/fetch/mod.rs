//! reqwest-backed network transport.
//!
//! ### Request handling
//! - Method, URL and headers are forwarded as-is
//! - Redirects are followed (max 10, matching browser `follow` mode)
//! - Bodies are fully buffered; anything over `max_bytes` is rejected
//!
//! ### Status handling
//! - Every HTTP status is returned as a response; only transport failures
//!   are errors

use bytes::Bytes;
use reqwest::{Client, Method};
use std::time::{Duration, Instant};

use offcache_core::{AppConfig, Error, Request, Response, ResponseType};

use crate::network::Network;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "offcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "offcache/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 10,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP client used for live fetches.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Bytes, Error> {
        if let Some(len) = response.content_length()
            && usize::try_from(len).unwrap_or(usize::MAX) > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timed out fetching {}", request.url))
            } else {
                Error::Network(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect::<Vec<_>>();

        let body = self.read_body(response).await?;

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        let response_type =
            if final_url.origin() == request.url.origin() { ResponseType::Basic } else { ResponseType::Cors };

        Ok(Response {
            headers,
            ..Response::new(status.as_u16(), status.canonical_reason().unwrap_or_default(), body).with_type(response_type)
        })
    }
}
