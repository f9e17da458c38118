//! Caching strategies.
//!
//! ### Cache-first
//! Serve from the store; on a miss fetch, store a 2xx copy and return it.
//! Network failure yields the offline fallback.
//!
//! ### Network-first
//! Fetch; store a 2xx copy over any previous entry. Network failure falls
//! back to the store, then to the offline fallback.
//!
//! ### Stale-while-revalidate
//! Start the fetch and read the store at the same time. A hit is returned at
//! once and the fetch keeps running as a [`Revalidation`]; a miss waits for
//! the fetch.
//!
//! Strategies never fail: store errors are logged and treated as a miss or a
//! skipped write, network errors take the strategy's fallback path.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::Error;
use crate::cache::{CacheRegistry, StoreKind};
use crate::classify::Category;
use crate::fallback::build_fallback;
use crate::http::{Network, Request, Response};

/// The three interchangeable strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    /// Strategy and store for a category; `None` for excluded requests.
    pub fn for_category(category: Category) -> Option<(Strategy, StoreKind)> {
        match category {
            Category::CriticalAsset | Category::StaticAsset => Some((Strategy::CacheFirst, StoreKind::Static)),
            Category::DynamicContent => Some((Strategy::NetworkFirst, StoreKind::Dynamic)),
            Category::RevalidatableContent => Some((Strategy::StaleWhileRevalidate, StoreKind::Runtime)),
            Category::Excluded => None,
        }
    }
}

/// Where a returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    Fallback,
}

/// Background refresh started by stale-while-revalidate.
///
/// The host must keep the worker alive until this settles.
#[derive(Debug)]
pub struct Revalidation {
    url: String,
    handle: JoinHandle<Option<Response>>,
}

impl Revalidation {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the refresh. `None` if the network failed.
    pub async fn settled(self) -> Option<Response> {
        match self.handle.await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %self.url, "revalidation task failed: {e}");
                None
            }
        }
    }
}

/// Outcome of running a strategy.
#[derive(Debug)]
pub struct Handled {
    pub response: Response,
    pub source: ResponseSource,
    pub revalidation: Option<Revalidation>,
}

impl Handled {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self { response, source, revalidation: None }
    }
}

/// Runs strategies against the registry and the network.
#[derive(Clone)]
pub struct StrategyExecutor {
    registry: CacheRegistry,
    network: Arc<dyn Network>,
    timeout: Duration,
}

impl StrategyExecutor {
    pub fn new(registry: CacheRegistry, network: Arc<dyn Network>, timeout: Duration) -> Self {
        Self { registry, network, timeout }
    }

    pub async fn execute(&self, strategy: Strategy, request: &Request, store: &str) -> Handled {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request, store).await,
            Strategy::NetworkFirst => self.network_first(request, store).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request, store).await,
        }
    }

    pub async fn cache_first(&self, request: &Request, store: &str) -> Handled {
        if let Some(cached) = self.lookup(store, request).await {
            tracing::debug!(url = %request.url, store, "served from cache");
            return Handled::new(cached, ResponseSource::Cache);
        }

        match self.fetch_bounded(request).await {
            Ok(response) => {
                self.remember(store, request, &response).await;
                Handled::new(response, ResponseSource::Network)
            }
            Err(e) => {
                log_fetch_failure(request, "cache-first miss", &e);
                Handled::new(build_fallback(request), ResponseSource::Fallback)
            }
        }
    }

    pub async fn network_first(&self, request: &Request, store: &str) -> Handled {
        match self.fetch_bounded(request).await {
            Ok(response) => {
                self.remember(store, request, &response).await;
                Handled::new(response, ResponseSource::Network)
            }
            Err(e) => {
                log_fetch_failure(request, "network-first, trying cache", &e);
                match self.lookup(store, request).await {
                    Some(cached) => Handled::new(cached, ResponseSource::Cache),
                    None => Handled::new(build_fallback(request), ResponseSource::Fallback),
                }
            }
        }
    }

    pub async fn stale_while_revalidate(&self, request: &Request, store: &str) -> Handled {
        let revalidation = self.spawn_revalidation(request.clone(), store.to_string());

        if let Some(cached) = self.lookup(store, request).await {
            return Handled { response: cached, source: ResponseSource::Cache, revalidation: Some(revalidation) };
        }

        match revalidation.settled().await {
            Some(response) => Handled::new(response, ResponseSource::Network),
            None => Handled::new(build_fallback(request), ResponseSource::Fallback),
        }
    }

    /// Fetch `request` and, on 2xx, write it to `store`.
    ///
    /// Used by the control channel and background sync.
    pub async fn refresh(&self, request: &Request, store: &str) -> Result<Response, Error> {
        let response = self.fetch_bounded(request).await?;
        if response.is_success() {
            self.registry.put(store, request, &response).await?;
        }
        Ok(response)
    }

    fn spawn_revalidation(&self, request: Request, store: String) -> Revalidation {
        let url = request.url.to_string();
        let executor = self.clone();
        let handle = tokio::spawn(async move {
            match executor.fetch_bounded(&request).await {
                Ok(response) => {
                    executor.remember(&store, &request, &response).await;
                    tracing::debug!(url = %request.url, store = %store, "revalidated in background");
                    Some(response)
                }
                Err(e) => {
                    log_fetch_failure(&request, "background revalidation", &e);
                    None
                }
            }
        });
        Revalidation { url, handle }
    }

    /// Network fetch bounded by the configured timeout.
    pub(crate) async fn fetch_bounded(&self, request: &Request) -> Result<Response, Error> {
        match tokio::time::timeout(self.timeout, self.network.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!("{} after {}ms", request.url, self.timeout.as_millis()))),
        }
    }

    async fn lookup(&self, store: &str, request: &Request) -> Option<Response> {
        match self.registry.match_request(store, request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %request.url, store, "cache lookup failed: {e}");
                None
            }
        }
    }

    /// Write a 2xx response; anything else passes through uncached.
    async fn remember(&self, store: &str, request: &Request, response: &Response) {
        if !response.is_success() {
            tracing::debug!(url = %request.url, status = response.status, "not caching error response");
            return;
        }
        if let Err(e) = self.registry.put(store, request, response).await {
            tracing::warn!(url = %request.url, store, "cache write failed: {e}");
        }
    }
}

/// Network failures log at info, any other fetch error at warn. Callers
/// fall back to cache or the offline page either way.
fn log_fetch_failure(request: &Request, context: &str, err: &Error) {
    if err.is_network_failure() {
        tracing::info!(url = %request.url, "{context}: {err}");
    } else {
        tracing::warn!(url = %request.url, "{context}: unexpected fetch error: {err}");
    }
}

/// Precache fetches go through the same timeout as strategy fetches.
#[async_trait::async_trait]
impl Network for StrategyExecutor {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.fetch_bounded(request).await
    }
}
