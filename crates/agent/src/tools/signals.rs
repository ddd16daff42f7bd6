//! sync, periodic_sync and push tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{json_result, unexpected_outcome};
use crate::worker::{Event, EventOutcome, ServiceWorker};

/// Input parameters for the sync and periodic_sync tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Registration tag of the signal.
    pub tag: String,
}

/// Output structure for the sync and periodic_sync tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncOutput {
    pub tag: String,
    /// Whether the tag matched a registered action.
    pub handled: bool,
}

/// Input parameters for the push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Text payload; a default body is used when absent.
    #[serde(default)]
    pub payload: Option<String>,
}

async fn synced(worker: &ServiceWorker, event: Event) -> Result<CallToolResult, McpError> {
    let kind = event.kind();
    match worker.dispatch(event).await? {
        EventOutcome::Synced { tag, handled } => json_result(&SyncOutput { tag, handled }),
        _ => Err(unexpected_outcome(kind)),
    }
}

pub async fn sync_impl(worker: &ServiceWorker, params: SyncParams) -> Result<CallToolResult, McpError> {
    synced(worker, Event::Sync(params.tag)).await
}

pub async fn periodic_sync_impl(worker: &ServiceWorker, params: SyncParams) -> Result<CallToolResult, McpError> {
    synced(worker, Event::PeriodicSync(params.tag)).await
}

/// Implementation of the push tool. Returns the notification that was shown.
pub async fn push_impl(worker: &ServiceWorker, params: PushParams) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Push(params.payload)).await? {
        EventOutcome::Notified(notification) => json_result(&notification),
        _ => Err(unexpected_outcome("push")),
    }
}
