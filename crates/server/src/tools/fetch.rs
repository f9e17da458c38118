//! sw_fetch tool implementation.
//!
//! Runs one intercepted request through the worker and reports how it was answered.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swkit_client::canonicalize;
use swkit_core::strategy::ResponseSource;
use swkit_core::{Category, FetchDisposition, Request, ServiceWorkerCore};
use url::Url;

use super::json_result;
use crate::error::AdapterError;
use crate::keepalive::KeepAlive;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header, used to pick the offline fallback.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutput {
    pub url: String,
    pub category: Category,
    /// "respond" or "passthrough".
    pub disposition: &'static str,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// A background refresh is still running for this URL.
    pub revalidating: bool,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    core: &ServiceWorkerCore, origin: &Url, keepalive: &KeepAlive, params: FetchParams,
) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, origin).map_err(AdapterError::from)?;
    if params.method.trim().is_empty() {
        return Err(AdapterError::InvalidInput("method cannot be empty".into()).into());
    }

    let mut request = Request::new(params.method.trim(), url);
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_header("Accept", accept);
    }
    let category = core.classify(&request);

    let output = match core.handle_fetch(&request).await {
        FetchDisposition::Passthrough => FetchOutput {
            url: request.url.to_string(),
            category,
            disposition: "passthrough",
            source: None,
            status: None,
            status_text: None,
            headers: Vec::new(),
            body: None,
            revalidating: false,
        },
        FetchDisposition::Respond(handled) => {
            let revalidating = handled.revalidation.is_some();
            if let Some(revalidation) = handled.revalidation {
                keepalive.hold(revalidation).await;
            }
            let response = handled.response;
            FetchOutput {
                url: request.url.to_string(),
                category,
                disposition: "respond",
                source: Some(handled.source),
                status: Some(response.status),
                status_text: Some(response.status_text),
                body: Some(String::from_utf8_lossy(&response.body).into_owned()),
                headers: response.headers,
                revalidating,
            }
        }
    };

    json_result(&output)
}
