//! Request classification.
//!
//! Maps an intercepted request to the category that decides its strategy.
//! Rules are evaluated in a fixed order and the first match wins:
//!
//! 1. Non-GET requests are excluded.
//! 2. Extension-scheme URLs are excluded.
//! 3. Manifest members and known static extensions are static assets.
//! 4. Dynamic patterns (API paths, JSON, third-party hosts) are dynamic.
//! 5. Revalidate prefixes and query strings are revalidatable.
//! 6. Everything else is dynamic.
//!
//! Structural matches (manifest, extension) come before the heuristic
//! patterns, so a static file under `/api/` still takes the fast path.

use std::collections::HashSet;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, ConfigError};
use crate::http::Request;

/// What kind of content a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    CriticalAsset,
    StaticAsset,
    DynamicContent,
    RevalidatableContent,
    /// Left to the host's default network handling.
    Excluded,
}

/// Compiled classification tables.
#[derive(Debug, Clone)]
pub struct Classifier {
    critical: HashSet<String>,
    statics: HashSet<String>,
    extensions: Vec<String>,
    dynamic: RegexSet,
    revalidate_prefixes: Vec<String>,
    excluded: RegexSet,
}

impl Classifier {
    /// Compile the tables from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a pattern is not a valid regex.
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let dynamic = RegexSet::new(&config.dynamic_patterns)
            .map_err(|e| ConfigError::Invalid { field: "dynamic_patterns".into(), reason: e.to_string() })?;
        let excluded = RegexSet::new(&config.excluded_patterns)
            .map_err(|e| ConfigError::Invalid { field: "excluded_patterns".into(), reason: e.to_string() })?;

        Ok(Self {
            critical: config.critical_assets.iter().cloned().collect(),
            statics: config.static_assets.iter().cloned().collect(),
            extensions: config.static_extensions.clone(),
            dynamic,
            revalidate_prefixes: config.revalidate_prefixes.clone(),
            excluded,
        })
    }

    /// Classify a request. Total: every request gets exactly one category.
    pub fn classify(&self, request: &Request) -> Category {
        if !request.is_get() {
            return Category::Excluded;
        }

        let href = request.url.as_str();
        if self.excluded.is_match(href) {
            return Category::Excluded;
        }

        let path = request.url.path();
        if self.critical.contains(path) {
            return Category::CriticalAsset;
        }
        if self.statics.contains(path) || self.extensions.iter().any(|ext| path.ends_with(ext.as_str())) {
            return Category::StaticAsset;
        }

        if self.dynamic.is_match(&host_and_path(request)) {
            return Category::DynamicContent;
        }

        if self.revalidate_prefixes.iter().any(|p| path.starts_with(p.as_str())) || request.url.query().is_some() {
            return Category::RevalidatableContent;
        }

        Category::DynamicContent
    }
}

/// What dynamic patterns match against: host plus path, no scheme or query.
fn host_and_path(request: &Request) -> String {
    format!("{}{}", request.url.host_str().unwrap_or_default(), request.url.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn classifier() -> Classifier {
        Classifier::new(&AppConfig::default()).unwrap()
    }

    fn get(url: &str) -> Request {
        Request::parse_get(url).unwrap()
    }

    #[test]
    fn test_non_get_excluded() {
        let req = Request::new("POST", Url::parse("https://site.test/api/contact").unwrap());
        assert_eq!(classifier().classify(&req), Category::Excluded);
    }

    #[test]
    fn test_extension_schemes_excluded() {
        let c = classifier();
        assert_eq!(c.classify(&get("chrome-extension://abcdef/script.js")), Category::Excluded);
        assert_eq!(c.classify(&get("moz-extension://abcdef/icon.png")), Category::Excluded);
    }

    #[test]
    fn test_critical_assets() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/")), Category::CriticalAsset);
        assert_eq!(c.classify(&get("https://site.test/index.html")), Category::CriticalAsset);
    }

    #[test]
    fn test_static_by_manifest_and_extension() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/images/avatar.webp")), Category::StaticAsset);
        assert_eq!(c.classify(&get("https://site.test/assets/chunk-abc123.js")), Category::StaticAsset);
        assert_eq!(c.classify(&get("https://fonts.example.test/inter.woff2")), Category::StaticAsset);
    }

    #[test]
    fn test_static_wins_over_dynamic_pattern() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/api/logo.svg")), Category::StaticAsset);
    }

    #[test]
    fn test_dynamic_patterns() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/api/projects")), Category::DynamicContent);
        assert_eq!(c.classify(&get("https://site.test/data/i18n.json")), Category::DynamicContent);
        assert_eq!(c.classify(&get("https://www.googleapis.com/css2")), Category::DynamicContent);
    }

    #[test]
    fn test_revalidatable_prefixes_and_queries() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/blog/first-post")), Category::RevalidatableContent);
        assert_eq!(c.classify(&get("https://site.test/portfolio/case-study")), Category::RevalidatableContent);
        assert_eq!(c.classify(&get("https://site.test/about?lang=it")), Category::RevalidatableContent);
    }

    #[test]
    fn test_dynamic_patterns_ignore_query() {
        let c = classifier();
        assert_eq!(c.classify(&get("https://site.test/data/i18n.json?v=3")), Category::DynamicContent);
        assert_eq!(c.classify(&get("https://site.test/x.json?v=1")), Category::DynamicContent);
        assert_eq!(
            c.classify(&get("https://fonts.googleapis.com/css2?family=Inter")),
            Category::DynamicContent
        );
    }

    #[test]
    fn test_fallback_is_dynamic() {
        assert_eq!(classifier().classify(&get("https://site.test/contact")), Category::DynamicContent);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = classifier();
        for url in [
            "https://site.test/",
            "https://site.test/blog/x",
            "https://site.test/api/y",
            "https://site.test/other",
            "chrome-extension://id/x",
        ] {
            let req = get(url);
            assert_eq!(c.classify(&req), c.classify(&req));
        }
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = AppConfig { excluded_patterns: vec!["[".into()], ..Default::default() };
        assert!(matches!(Classifier::new(&config), Err(ConfigError::Invalid { .. })));
    }
}
