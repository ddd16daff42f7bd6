//! install and activate tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};

use super::{json_result, unexpected_outcome};
use crate::worker::{Event, EventOutcome, ServiceWorker};

/// Run the install event: open the current generation and cache the manifest.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Install).await? {
        EventOutcome::Installed(report) => json_result(&report),
        _ => Err(unexpected_outcome("install")),
    }
}

/// Run the activate event: delete stale generations and claim clients.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Activate).await? {
        EventOutcome::Activated(report) => json_result(&report),
        _ => Err(unexpected_outcome("activate")),
    }
}
