//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker core.
use std::sync::Arc;

use crate::keepalive::KeepAlive;
use crate::tools::{
    FetchParams, MessageParams, NotificationClickParams, PushParams, SyncParams, events, fetch, lifecycle, message,
};

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
use swkit_core::ServiceWorkerCore;
use url::Url;

/// The main MCP server handler for swkit.
#[derive(Clone)]
pub struct SwServer {
    core: Arc<ServiceWorkerCore>,
    origin: Url,
    keepalive: KeepAlive,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SwServer {
    /// Create a new server handler around a worker core.
    pub fn new(core: Arc<ServiceWorkerCore>, origin: Url) -> Self {
        Self { core, origin, keepalive: KeepAlive::default(), tool_router: Self::tool_router() }
    }

    /// Handle to the background work started through this server.
    pub fn keepalive(&self) -> KeepAlive {
        self.keepalive.clone()
    }

    #[tool(description = "Install the worker: precache the asset manifest. Activates immediately on success.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        lifecycle::install_impl(&self.core).await
    }

    #[tool(description = "Activate an installed worker: delete caches from other versions and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        lifecycle::activate_impl(&self.core).await
    }

    /// Intercept one request.
    ///
    /// Reports the classification, whether the worker answered or let the request
    /// through, and where the answer came from.
    #[tool(description = "Send a request through the worker. Returns the response and whether it came from cache, network, or the offline fallback.")]
    async fn sw_fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch::fetch_impl(&self.core, &self.origin, &self.keepalive, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING, GET_VERSION, CACHE_URL, DELETE_CACHE, GET_CACHE_INFO). Returns any reply.")]
    async fn sw_message(&self, params: Parameters<MessageParams>) -> Result<CallToolResult, McpError> {
        message::message_impl(&self.core, params.0).await
    }

    #[tool(description = "Deliver a push message. Returns the notification to display, or null.")]
    async fn sw_push(&self, params: Parameters<PushParams>) -> Result<CallToolResult, McpError> {
        events::push_impl(&self.core, params.0)
    }

    #[tool(description = "Deliver a notification click. Returns the window to open, if any.")]
    async fn sw_notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        events::notification_click_impl(&self.core, params.0)
    }

    #[tool(description = "Deliver a background sync event. The 'background-sync' tag refreshes every dynamic cache entry.")]
    async fn sw_sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        events::sync_impl(&self.core, params.0).await
    }
}

impl ServerHandler for SwServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swkit".into(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::core;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = SwServer::new(core(&[]).await, Url::parse("https://site.test/").unwrap());
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "sw_activate",
                "sw_fetch",
                "sw_install",
                "sw_message",
                "sw_notification_click",
                "sw_push",
                "sw_sync"
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = SwServer::new(core(&[]).await, Url::parse("https://site.test/").unwrap());
        assert_eq!(server.get_info().server_info.name, "swkit");
    }
}
