//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use regex::Regex;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_patterns(field: &str, patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        Regex::new(pattern).map_err(|e| invalid(field, format!("bad pattern {pattern:?}: {e}")))?;
    }
    Ok(())
}

fn check_paths(field: &str, paths: &[String]) -> Result<(), ConfigError> {
    if let Some(bad) = paths.iter().find(|p| !p.starts_with('/')) {
        return Err(invalid(field, format!("{bad:?} must be an absolute path")));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty version tag and
    /// `ConfigError::Invalid` if:
    /// - `version_tag` contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `network_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    /// - a manifest path is not absolute or an extension lacks its dot
    /// - a pattern is not a valid regex
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_tag.is_empty() {
            return Err(ConfigError::Missing {
                field: "version_tag".into(),
                hint: "Set SWKIT_VERSION_TAG environment variable".into(),
            });
        }
        if self.version_tag.chars().any(char::is_whitespace) {
            return Err(invalid("version_tag", "must not contain whitespace"));
        }

        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        if self.network_timeout_ms < 100 {
            return Err(invalid("network_timeout_ms", "must be at least 100ms"));
        }
        if self.network_timeout_ms > 300_000 {
            return Err(invalid("network_timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        check_paths("critical_assets", &self.critical_assets)?;
        check_paths("static_assets", &self.static_assets)?;
        check_paths("revalidate_prefixes", &self.revalidate_prefixes)?;

        if let Some(bad) = self.static_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(invalid("static_extensions", format!("{bad:?} must start with '.'")));
        }

        check_patterns("dynamic_patterns", &self.dynamic_patterns)?;
        check_patterns("excluded_patterns", &self.excluded_patterns)?;

        let shadowed: Vec<&str> = self
            .revalidate_prefixes
            .iter()
            .filter(|prefix| {
                self.dynamic_patterns
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .any(|re| re.is_match(prefix))
            })
            .map(String::as_str)
            .collect();
        if !shadowed.is_empty() {
            tracing::warn!(
                ?shadowed,
                "revalidate prefixes also match a dynamic pattern; \
                 dynamic patterns take precedence"
            );
        }

        Ok(())
    }
}
