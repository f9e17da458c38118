//! MCP tool implementations.
//!
//! Each tool maps one host event onto the worker core.

pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use events::{NotificationClickParams, PushParams, SyncParams};
pub use fetch::FetchParams;
pub use message::MessageParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::AdapterError;

/// Encode a tool output as pretty JSON text content.
pub(crate) fn json_result(output: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| AdapterError::EncodeFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
