//! Errors raised by the tool layer itself.
//!
//! Engine errors convert through `swkit_core::Error`; these cover what the
//! adapter rejects before the engine sees it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use swkit_client::UrlError;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Invalid tool parameters (e.g., an unparseable URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A tool result could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    EncodeFailed(String),
}

impl From<UrlError> for AdapterError {
    fn from(err: UrlError) -> Self {
        AdapterError::InvalidInput(err.to_string())
    }
}

impl From<AdapterError> for McpError {
    fn from(err: AdapterError) -> Self {
        let code = match &err {
            AdapterError::InvalidInput(_) => -32602,
            AdapterError::EncodeFailed(_) => -32000,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_error_is_invalid_input() {
        let err: McpError = AdapterError::from(UrlError::Empty).into();
        assert_eq!(err.code, ErrorCode(-32602));
        assert_eq!(err.message, "INVALID_INPUT: empty URL");
    }

    #[test]
    fn test_encode_failed_code() {
        let err: McpError = AdapterError::EncodeFailed("boom".into()).into();
        assert_eq!(err.code, ErrorCode(-32000));
    }
}
