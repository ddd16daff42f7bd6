//! MCP server handler implementation.
//!
//! Each tool delivers one lifecycle event to the shared [`ServiceWorker`].
use std::sync::Arc;

use crate::tools::{
    FetchParams, PushParams, SyncParams, activate_impl, fetch_impl, install_impl, periodic_sync_impl, push_impl,
    status_impl, sync_impl,
};
use crate::worker::{RecordingHost, ServiceWorker};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for offcache.
#[derive(Clone)]
pub struct OffcacheServer {
    worker: Arc<ServiceWorker>,
    host: Arc<RecordingHost>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OffcacheServer {
    pub fn new(worker: Arc<ServiceWorker>, host: Arc<RecordingHost>) -> Self {
        Self { worker, host, tool_router: Self::tool_router() }
    }

    #[tool(description = "Run the install event: open the current cache generation and pre-cache the asset manifest.")]
    async fn install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Run the activate event: delete every cache generation except the current one and claim clients.")]
    async fn activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Resolve a request cache-first with network and offline fallbacks.
    ///
    /// Non-GET and non-http(s) requests are reported as not intercepted.
    #[tool(
        description = "Deliver a fetch event. GET http(s) requests are answered from the cache, the network, or a 503 offline fallback."
    )]
    async fn fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a background sync signal. The 'sync-data' tag runs the data sync action.")]
    async fn sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a periodic sync signal. The 'update-data' tag runs the periodic update action.")]
    async fn periodic_sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        periodic_sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push signal and show a notification with the payload text.")]
    async fn push(&self, params: Parameters<PushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(
        description = "Report lifecycle state, cache generations, URLs cached in the current generation, and the client control and notifications requested so far."
    )]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker, &self.host).await
    }
}

impl ServerHandler for OffcacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
