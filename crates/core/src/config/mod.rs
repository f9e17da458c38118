//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWKIT_*)
//! 2. TOML config file (if SWKIT_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The asset manifest and the classification tables are part of the
//! configuration so the engine never reads ambient globals.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::VersionTag;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWKIT_*)
/// 2. TOML config file (if SWKIT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version tag embedded in every store name.
    ///
    /// Set via SWKIT_VERSION_TAG environment variable.
    #[serde(default = "default_version_tag")]
    pub version_tag: String,

    /// Origin that manifest paths are resolved against.
    ///
    /// Set via SWKIT_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SWKIT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    ///
    /// Set via SWKIT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes accepted per network response.
    ///
    /// Set via SWKIT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upper bound on a single network fetch, in milliseconds.
    ///
    /// Set via SWKIT_NETWORK_TIMEOUT_MS environment variable.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// Assets that must be available offline.
    #[serde(default = "default_critical_assets")]
    pub critical_assets: Vec<String>,

    /// Further static assets precached alongside the critical ones.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Path suffixes always treated as static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Regexes (matched against host plus path) for network-first content.
    #[serde(default = "default_dynamic_patterns")]
    pub dynamic_patterns: Vec<String>,

    /// Path prefixes served stale-while-revalidate.
    #[serde(default = "default_revalidate_prefixes")]
    pub revalidate_prefixes: Vec<String>,

    /// Regexes (matched against the full URL) never intercepted.
    #[serde(default = "default_excluded_patterns")]
    pub excluded_patterns: Vec<String>,
}

fn default_version_tag() -> String {
    "alice-portfolio-v2.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:4173/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swkit-cache.sqlite")
}

fn default_user_agent() -> String {
    "swkit/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_network_timeout_ms() -> u64 {
    20_000
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_critical_assets() -> Vec<String> {
    strings(&[
        "/",
        "/index.html",
        "/manifest.json",
        "/favicon.ico",
        "/favicon.svg",
        "/icon-192x192.png",
        "/icon-512x512.png",
        "/apple-touch-icon.png",
    ])
}

fn default_static_assets() -> Vec<String> {
    strings(&[
        "/assets/index.css",
        "/assets/index.js",
        "/fonts/inter-var.woff2",
        "/images/hero-bg.webp",
        "/images/avatar.webp",
    ])
}

fn default_static_extensions() -> Vec<String> {
    strings(&[
        ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".woff", ".woff2", ".ttf", ".webp", ".avif",
    ])
}

fn default_dynamic_patterns() -> Vec<String> {
    strings(&[r"/api/", r"\.json$", r"googleapis\.com", r"analytics"])
}

fn default_revalidate_prefixes() -> Vec<String> {
    strings(&["/blog/", "/portfolio/"])
}

fn default_excluded_patterns() -> Vec<String> {
    strings(&[r"^chrome-extension:", r"^moz-extension:", r"^safari-extension:", r"^edge-extension:"])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version_tag: default_version_tag(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            network_timeout_ms: default_network_timeout_ms(),
            critical_assets: default_critical_assets(),
            static_assets: default_static_assets(),
            static_extensions: default_static_extensions(),
            dynamic_patterns: default_dynamic_patterns(),
            revalidate_prefixes: default_revalidate_prefixes(),
            excluded_patterns: default_excluded_patterns(),
        }
    }
}

impl AppConfig {
    /// Network timeout as Duration for use with reqwest/tokio.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    pub fn version(&self) -> VersionTag {
        VersionTag::new(self.version_tag.clone())
    }

    /// Parsed origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an absolute URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Everything precached on install: critical assets first, then the
    /// remaining static assets, without duplicates.
    pub fn precache_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::with_capacity(self.critical_assets.len() + self.static_assets.len());
        for path in self.critical_assets.iter().chain(&self.static_assets) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWKIT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWKIT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
