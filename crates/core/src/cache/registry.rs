//! Versioned cache registry.
//!
//! The registry is the only way the rest of the engine touches stores. It
//! derives store names from the current [`VersionTag`], enforces the
//! "GET only, 2xx only" cacheability rule, and implements the all-or-nothing
//! precache used by install.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::connection::CacheDb;
use super::hash::compute_entry_key;
use super::stores::StoredEntry;
use crate::Error;
use crate::http::{Network, Request, Response};

/// Identifier of the deployed asset generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<kind>-<tag>`, e.g. `static-alice-portfolio-v2.0.0`.
    pub fn store_name(&self, kind: StoreKind) -> String {
        format!("{}-{}", kind.prefix(), self.0)
    }

    /// Whether a store belongs to this generation.
    pub fn owns(&self, store_name: &str) -> bool {
        store_name.contains(&self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three stores of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Precached critical and static assets.
    Static,
    /// Network-first content and manually cached URLs.
    Dynamic,
    /// Stale-while-revalidate content.
    Runtime,
}

impl StoreKind {
    pub fn prefix(self) -> &'static str {
        match self {
            StoreKind::Static => "static",
            StoreKind::Dynamic => "dynamic",
            StoreKind::Runtime => "runtime",
        }
    }
}

/// Store access keyed by the current version tag.
#[derive(Clone, Debug)]
pub struct CacheRegistry {
    db: CacheDb,
    version: VersionTag,
}

impl CacheRegistry {
    pub fn new(db: CacheDb, version: VersionTag) -> Self {
        Self { db, version }
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Name of the current generation's store of `kind`.
    pub fn store_name(&self, kind: StoreKind) -> String {
        self.version.store_name(kind)
    }

    /// Create the store if needed. Idempotent.
    pub async fn open_or_create(&self, store: &str) -> Result<(), Error> {
        self.db.create_store(store).await
    }

    /// Fetch every request and store all responses, or store nothing.
    ///
    /// Fails on the first request that errors or answers with a non-2xx status.
    pub async fn put_all(&self, store: &str, requests: &[Request], network: &dyn Network) -> Result<(), Error> {
        self.open_or_create(store).await?;

        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            let url = request.cache_url();
            let response = network
                .fetch(request)
                .await
                .map_err(|e| Error::PrecacheFailed { url: url.clone(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::PrecacheFailed { url, reason: format!("status {}", response.status) });
            }
            entries.push(StoredEntry::new(store, &request.method, &url, response));
        }

        let count = entries.len();
        self.db.upsert_entries(entries).await?;
        tracing::debug!(store, count, "precached entries");
        Ok(())
    }

    /// Look up `request` in exactly one store.
    pub async fn match_request(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = compute_entry_key(&request.method, &request.cache_url());
        Ok(self.db.get_entry(store, &key).await?.map(|entry| entry.response))
    }

    /// Store a response for `request`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotCacheable` for non-GET requests and non-2xx responses.
    pub async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        if !request.is_get() {
            return Err(Error::NotCacheable(format!("{} {}", request.method, request.url)));
        }
        if !response.is_success() {
            return Err(Error::NotCacheable(format!("status {} for {}", response.status, request.url)));
        }
        let entry = StoredEntry::new(store, &request.method, &request.cache_url(), response.clone());
        self.db.upsert_entry(&entry).await
    }

    pub async fn delete_store(&self, store: &str) -> Result<bool, Error> {
        self.db.delete_store(store).await
    }

    pub async fn list_store_names(&self) -> Result<Vec<String>, Error> {
        self.db.list_stores().await
    }

    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        self.db.count_entries(store).await
    }

    /// URLs currently held by a store.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<String>, Error> {
        self.db.list_entry_urls(store).await
    }
}
