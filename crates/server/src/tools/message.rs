//! sw_message tool implementation.
//!
//! Delivers a control message as a page client would, with a reply port for
//! the message types that answer.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swkit_core::{ControlMessage, ReplyPort, ServiceWorkerCore};

use super::json_result;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MessageParams {
    /// The message, e.g. `{"type": "CACHE_URL", "data": {"url": "/blog/post"}}`.
    pub message: serde_json::Value,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize)]
pub struct MessageOutput {
    /// Wire type of the message, if it was recognised.
    #[serde(rename = "type")]
    pub kind: Option<&'static str>,
    pub handled: bool,
    /// Whatever the worker posted back on the reply port.
    pub reply: Option<serde_json::Value>,
}

/// Implementation of the sw_message tool. Unrecognised messages are ignored.
pub async fn message_impl(core: &ServiceWorkerCore, params: MessageParams) -> Result<CallToolResult, McpError> {
    let message = match ControlMessage::from_json(params.message) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("ignoring control message: {e}");
            return json_result(&MessageOutput { kind: None, handled: false, reply: None });
        }
    };

    let kind = message.kind();
    let (port, mut rx) = ReplyPort::channel();
    core.handle_message(message, Some(port)).await;

    json_result(&MessageOutput { kind: Some(kind), handled: true, reply: rx.try_recv().ok() })
}
