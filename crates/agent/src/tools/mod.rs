//! MCP tool implementations.
//!
//! Each tool delivers one lifecycle event to the manager and reports what
//! it produced as pretty-printed JSON.

pub mod fetch;
pub mod lifecycle;
pub mod signals;
pub mod status;

pub use fetch::{FetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};
pub use signals::{PushParams, SyncParams, periodic_sync_impl, push_impl, sync_impl};
pub use status::status_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Serialize a tool output as the text content of a successful result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize output: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Error for a dispatch that produced the wrong kind of outcome.
pub(crate) fn unexpected_outcome(event: &str) -> McpError {
    McpError::internal_error(format!("{event} produced an unexpected outcome"), None)
}
