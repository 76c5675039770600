//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{OfflineFetchParams, activate_impl, fetch_impl, status_impl};

use fitshell_client::{CacheController, ControllerHandle};
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
use url::Url;

/// The main MCP server handler for fitshell.
#[derive(Clone)]
pub struct FitshellServer {
    tool_router: ToolRouter<Self>,
    controller: Arc<CacheController>,
    handle: ControllerHandle,
    origin: Url,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl FitshellServer {
    /// Create a server over a running controller.
    pub fn new(controller: Arc<CacheController>, handle: ControllerHandle, origin: Url) -> Self {
        Self { tool_router: Self::tool_router(), controller, handle, origin }
    }

    /// Fetch a URL through the offline cache.
    #[tool(
        description = "Fetch a URL or app path through the offline cache. Cached GET responses are served without network access."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.handle, &self.origin, params.0).await
    }

    /// Report the cache lifecycle phase and stores.
    #[tool(description = "Report the cache controller phase, the current cache version and every store in storage.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller).await
    }

    /// Delete stale cache stores.
    #[tool(description = "Run cache activation: delete every cache store other than the current version.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.handle).await
    }
}

impl ServerHandler for FitshellServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "fitshell".into(),
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
