//! Push notifications and notification clicks.

use serde::{Deserialize, Serialize};

use crate::Error;

const NOTIFICATION_ICON: &str = "/icon-192x192.png";
const VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// Payload of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A button shown on a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

/// Data carried by a notification back to the click handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
}

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    pub require_interaction: bool,
    pub silent: bool,
}

/// What the host should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum ClickOutcome {
    OpenWindow(String),
    Close,
}

/// Build the notification for a push message. Empty pushes show nothing.
pub fn notification_for_push(payload: Option<&[u8]>) -> Result<Option<Notification>, Error> {
    let Some(raw) = payload.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let push: PushPayload =
        serde_json::from_slice(raw).map_err(|e| Error::InvalidInput(format!("bad push payload: {e}")))?;

    let action = |action: &str, title: &str| NotificationAction {
        action: action.to_string(),
        title: title.to_string(),
        icon: NOTIFICATION_ICON.to_string(),
    };

    Ok(Some(Notification {
        title: push.title,
        body: push.body,
        icon: NOTIFICATION_ICON.to_string(),
        badge: NOTIFICATION_ICON.to_string(),
        vibrate: VIBRATE_PATTERN.to_vec(),
        data: NotificationData {
            url: push.url.unwrap_or_else(|| "/".to_string()),
            date_of_arrival: chrono::Utc::now().timestamp_millis(),
        },
        actions: vec![action("explore", "View"), action("close", "Close")],
        require_interaction: false,
        silent: false,
    }))
}

/// Decide what a click does. The notification itself always closes.
pub fn on_notification_click(action: Option<&str>, data: Option<&NotificationData>) -> ClickOutcome {
    match action {
        Some("explore") => ClickOutcome::OpenWindow(data.map_or_else(|| "/".to_string(), |d| d.url.clone())),
        _ => ClickOutcome::Close,
    }
}
