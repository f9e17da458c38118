//! Synthetic responses for when neither a store nor the network can answer.

use crate::http::{Request, Response};

const OFFLINE_STATUS: u16 = 503;

/// Must not reference any external resource.
const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Offline</title>
  <style>
    body { font-family: system-ui, sans-serif; text-align: center; padding: 2rem; }
    .offline-icon { font-size: 4rem; margin-bottom: 1rem; }
  </style>
</head>
<body>
  <div class="offline-icon">&#128241;</div>
  <h1>You are offline</h1>
  <p>This page is not available offline.</p>
  <p>Check your connection and try again.</p>
  <button onclick="window.location.reload()">Retry</button>
</body>
</html>
"#;

const OFFLINE_TEXT: &str = "Content not available offline";

/// Build the offline response for `request`. Never fails, never does I/O.
pub fn build_fallback(request: &Request) -> Response {
    let wants_html = request
        .header("accept")
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        Response::new(OFFLINE_STATUS, OFFLINE_PAGE).with_header("Content-Type", "text/html; charset=utf-8")
    } else {
        Response::new(OFFLINE_STATUS, OFFLINE_TEXT).with_header("Content-Type", "text/plain; charset=utf-8")
    }
}
