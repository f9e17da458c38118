//! sw_push, sw_notification_click and sw_sync tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swkit_core::ServiceWorkerCore;
use swkit_core::notify::NotificationData;
use swkit_core::worker::BACKGROUND_SYNC_TAG;

use super::json_result;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Raw push payload text, normally JSON with `title`, `body` and `url`.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// The action button clicked, if any.
    #[serde(default)]
    pub action: Option<String>,

    /// The data attached to the notification when it was shown.
    #[serde(default)]
    pub data: Option<NotificationData>,
}

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync registration tag (default: "background-sync").
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_tag() -> String {
    BACKGROUND_SYNC_TAG.into()
}

/// Returns the notification to show, or `null` for an empty push.
pub fn push_impl(core: &ServiceWorkerCore, params: PushParams) -> Result<CallToolResult, McpError> {
    let notification = core.on_push(params.payload.as_deref().map(str::as_bytes))?;
    json_result(&notification)
}

pub fn notification_click_impl(
    core: &ServiceWorkerCore, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    json_result(&core.on_notification_click(params.action.as_deref(), params.data.as_ref()))
}

/// Returns the sync report, or `null` when the tag is not ours.
pub async fn sync_impl(core: &ServiceWorkerCore, params: SyncParams) -> Result<CallToolResult, McpError> {
    let report = core.on_sync(&params.tag).await?;
    json_result(&report)
}
