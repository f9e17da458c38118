//! Control messages sent from page clients to the worker.
//!
//! Wire format is `{ "type": "...", "data": { ... } }`. Replies travel over a
//! [`ReplyPort`] handed in with the message, mirroring a transferred
//! message-channel port.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::Error;

/// A typed control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    GetVersion,
    CacheUrl {
        url: String,
        #[serde(default, rename = "cacheName", skip_serializing_if = "Option::is_none")]
        cache_name: Option<String>,
    },
    DeleteCache {
        #[serde(rename = "cacheName")]
        cache_name: String,
    },
    GetCacheInfo,
}

impl ControlMessage {
    /// Decode a message from its JSON form.
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::InvalidInput(format!("bad control message: {e}")))
    }

    /// The wire `type` string.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "SKIP_WAITING",
            ControlMessage::GetVersion => "GET_VERSION",
            ControlMessage::CacheUrl { .. } => "CACHE_URL",
            ControlMessage::DeleteCache { .. } => "DELETE_CACHE",
            ControlMessage::GetCacheInfo => "GET_CACHE_INFO",
        }
    }
}

/// Reply to `GET_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// Reply to `GET_CACHE_INFO`: store name to entry count.
pub type CacheInfo = BTreeMap<String, u64>;

/// Sending half of a reply channel.
#[derive(Debug)]
pub struct ReplyPort(oneshot::Sender<serde_json::Value>);

impl ReplyPort {
    /// Create a port and the receiver the client listens on.
    pub fn channel() -> (Self, oneshot::Receiver<serde_json::Value>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Post a reply. A client that stopped listening is not an error.
    pub fn post(self, payload: &impl Serialize) {
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("failed to encode reply: {e}");
                return;
            }
        };
        if self.0.send(value).is_err() {
            tracing::debug!("reply port closed before reply was posted");
        }
    }
}
