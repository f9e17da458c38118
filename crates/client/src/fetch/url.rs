//! URL canonicalization for requests handed in by the host.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string before it reaches the engine.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative input against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Browser-extension schemes are accepted so the engine can exclude them.
pub fn canonicalize(input: &str, origin: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme if scheme.ends_with("-extension") => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str()
        && host.chars().any(|c| c.is_ascii_uppercase())
    {
        let lowered = host.to_ascii_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://portfolio.test/").unwrap()
    }

    #[test]
    fn test_canonicalize_absolute() {
        let url = canonicalize("https://cdn.example.com/app.js", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/app.js");
    }

    #[test]
    fn test_canonicalize_relative_path() {
        let url = canonicalize("/blog/hello", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://portfolio.test/blog/hello");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/Path", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("/index.html#top", &origin()).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("/api/posts?b=2&a=1", &origin()).unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize("  https://example.com  ", &origin()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_extension_scheme_kept() {
        let url = canonicalize("chrome-extension://abc/content.js", &origin()).unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd", &origin());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("", &origin()), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   ", &origin()), Err(UrlError::Empty)));
    }
}
