//! Request and response value types and the network seam.
//!
//! The engine never talks to a socket directly. Everything that needs the
//! network goes through the [`Network`] trait so the strategies and the
//! lifecycle can be driven by a stub in tests and by reqwest in production.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-cased HTTP method.
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Build a request with an arbitrary method.
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_ascii_uppercase(), url, headers: Vec::new() }
    }

    /// Build a GET request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parse `url` and build a GET request.
    pub fn parse_get(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::get(url))
    }

    /// Add a header, returning the request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// URL used as the store key: fragment removed, everything else kept.
    pub fn cache_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

/// A response snapshot, either fresh from the network or read back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status. `0` stands for an opaque response.
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    /// Exact bytes in memory and in stores. Serialized form is display-only text.
    #[serde(with = "body_text")]
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: reason_phrase(status).to_string(), headers: Vec::new(), body: body.into() }
    }

    /// Add a header, returning the response.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Only these responses may ever be written to a store.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

/// Display-only body encoding for tool output.
///
/// Invalid UTF-8 becomes U+FFFD, so a serialized binary body does not round
/// trip. Stores keep the raw bytes and never go through serde.
mod body_text {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&String::from_utf8_lossy(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let text = String::deserialize(d)?;
        Ok(Bytes::from(text))
    }
}

/// Network access used by the strategies, precache and control messages.
///
/// Implementations return `Ok` for any HTTP response, including error
/// statuses, and `Err` only when no response was obtained at all.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_uppercased() {
        let req = Request::new("post", Url::parse("https://example.com/").unwrap());
        assert_eq!(req.method, "POST");
        assert!(!req.is_get());
    }

    #[test]
    fn test_cache_url_drops_fragment() {
        let req = Request::parse_get("https://example.com/blog/post?id=1#top").unwrap();
        assert_eq!(req.cache_url(), "https://example.com/blog/post?id=1");
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let req = Request::parse_get("https://example.com/").unwrap().with_header("Accept", "text/html");
        assert_eq!(req.header("accept"), Some("text/html"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn test_success_range() {
        assert!(Response::new(200, "ok").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(0, "").is_success());
        assert!(!Response::new(304, "").is_success());
        assert!(!Response::new(404, "missing").is_success());
    }

    #[test]
    fn test_parse_get_invalid() {
        assert!(matches!(Request::parse_get("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_body_serializes_as_display_text() {
        let response = Response::new(200, Bytes::from_static(&[b'o', b'k', 0xff]));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["body"], "ok\u{fffd}");
        assert_eq!(response.body.len(), 3);
    }
}
