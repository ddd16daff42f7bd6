//! fetch tool implementation.
//!
//! Delivers an intercepted request to the manager and reports how it was
//! answered.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use offcache_core::{Error, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, unexpected_outcome};
use crate::worker::{Event, EventOutcome, FetchOutcome, ResponseSource, ServiceWorker};

/// A single header name and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderParam {
    pub name: String,
    pub value: String,
}

/// Input parameters for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// The request URL.
    pub url: String,

    /// HTTP method (default: GET). Only GET requests are intercepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers forwarded to the network.
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    /// False when the request was left to the host (non-GET or non-http).
    pub intercepted: bool,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
    /// Body decoded as UTF-8, lossy.
    pub body: Option<String>,
    pub body_base64: Option<String>,
}

impl FetchOutput {
    fn passthrough() -> Self {
        Self {
            intercepted: false,
            source: None,
            status: None,
            status_text: None,
            headers: Vec::new(),
            body: None,
            body_base64: None,
        }
    }
}

impl From<FetchOutcome> for FetchOutput {
    fn from(outcome: FetchOutcome) -> Self {
        let response = outcome.response;
        Self {
            intercepted: true,
            source: Some(outcome.source),
            status: Some(response.status),
            status_text: Some(response.status_text),
            headers: response
                .headers
                .into_iter()
                .map(|(name, value)| HeaderParam { name, value })
                .collect(),
            body: Some(String::from_utf8_lossy(&response.body).into_owned()),
            body_base64: Some(STANDARD.encode(&response.body)),
        }
    }
}

/// Implementation of the fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: FetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let mut request = Request::new(&params.method, &params.url)?;
    for header in params.headers {
        request = request.with_header(header.name, header.value);
    }

    let output = match worker.dispatch(Event::Fetch(request)).await? {
        EventOutcome::Fetched(Some(outcome)) => FetchOutput::from(outcome),
        EventOutcome::Fetched(None) => FetchOutput::passthrough(),
        _ => return Err(unexpected_outcome("fetch")),
    };

    json_result(&output)
}
