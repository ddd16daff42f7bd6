//! status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::worker::host::{HostRecord, RecordingHost};
use crate::worker::{ServiceWorker, WorkerStatus};

/// Output structure for the status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub worker: WorkerStatus,
    /// Client control and notifications requested of the host so far.
    pub host: HostRecord,
}

/// Report lifecycle state, generations, cached URLs and host activity.
pub async fn status_impl(worker: &ServiceWorker, host: &RecordingHost) -> Result<CallToolResult, McpError> {
    let output = StatusOutput { worker: worker.status().await?, host: host.record().await };
    json_result(&output)
}
