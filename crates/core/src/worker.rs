//! The worker core: lifecycle, fetch interception and the control channel.
//!
//! [`ServiceWorkerCore`] exposes one method per host event. It never touches
//! the host runtime itself; anything that must outlive a call is handed back
//! to the caller (see [`Revalidation`](crate::strategy::Revalidation)).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::Error;
use crate::cache::{CacheDb, CacheRegistry, StoreKind, VersionTag};
use crate::classify::{Category, Classifier};
use crate::config::{AppConfig, ConfigError};
use crate::http::{Network, Request};
use crate::lifecycle::LifecycleState;
use crate::messages::{CacheInfo, ControlMessage, ReplyPort, VersionReply};
use crate::notify::{self, ClickOutcome, Notification, NotificationData};
use crate::strategy::{Handled, Strategy, StrategyExecutor};

/// Tag of the sync registration that refreshes the dynamic store.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// What the host should do with an intercepted request.
#[derive(Debug)]
pub enum FetchDisposition {
    /// Not ours: let the host perform its default network handling.
    Passthrough,
    Respond(Handled),
}

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    pub store: String,
    pub precached: usize,
    /// The worker asks to activate without waiting for old clients to close.
    pub skip_waiting: bool,
}

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// Result of a background sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// The offline caching engine behind one worker registration.
pub struct ServiceWorkerCore {
    registry: CacheRegistry,
    classifier: Classifier,
    executor: StrategyExecutor,
    origin: Url,
    precache: Vec<String>,
    state: RwLock<LifecycleState>,
    clients_claimed: AtomicBool,
}

impl ServiceWorkerCore {
    /// Build the core from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the origin or a classification pattern is invalid.
    pub fn new(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>) -> Result<Self, ConfigError> {
        let registry = CacheRegistry::new(db, config.version());
        let classifier = Classifier::new(config)?;
        let executor = StrategyExecutor::new(registry.clone(), network, config.network_timeout());

        Ok(Self {
            registry,
            classifier,
            executor,
            origin: config.origin_url()?,
            precache: config.precache_paths(),
            state: RwLock::new(LifecycleState::default()),
            clients_claimed: AtomicBool::new(false),
        })
    }

    pub fn version(&self) -> &VersionTag {
        self.registry.version()
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    pub fn classify(&self, request: &Request) -> Category {
        self.classifier.classify(request)
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    /// Resolve a manifest path or page-supplied URL against the origin.
    fn resolve(&self, url: &str) -> Result<Request, Error> {
        let url = self
            .origin
            .join(url)
            .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Request::get(url))
    }

    /// Precache the asset manifest into the current static store.
    ///
    /// # Errors
    ///
    /// Any failed asset fails the install and leaves the worker redundant
    /// until the next install attempt.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.state.write().await.transition(LifecycleState::Installing)?;
        tracing::info!(version = %self.version(), assets = self.precache.len(), "installing");

        let store = self.registry.store_name(StoreKind::Static);
        let result = async {
            let requests = self
                .precache
                .iter()
                .map(|path| self.resolve(path))
                .collect::<Result<Vec<_>, _>>()?;
            self.registry.put_all(&store, &requests, &self.executor).await
        }
        .await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.transition(LifecycleState::Installed)?;
                tracing::info!(store = %store, "install complete");
                Ok(InstallReport { store, precached: self.precache.len(), skip_waiting: true })
            }
            Err(e) => {
                state.transition(LifecycleState::Redundant)?;
                tracing::error!("install failed: {e}");
                Err(e)
            }
        }
    }

    /// Drop stores from other generations and take control of clients.
    ///
    /// Store cleanup is best-effort; only an illegal state is an error.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.state.write().await.transition(LifecycleState::Activating)?;
        tracing::info!(version = %self.version(), "activating");

        let mut deleted = Vec::new();
        match self.registry.list_store_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| !self.version().owns(n)) {
                    match self.registry.delete_store(&name).await {
                        Ok(_) => {
                            tracing::info!(store = %name, "deleted stale store");
                            deleted.push(name);
                        }
                        Err(e) => tracing::warn!(store = %name, "failed to delete stale store: {e}"),
                    }
                }
            }
            Err(e) => tracing::warn!("could not list stores during activation: {e}"),
        }

        self.clients_claimed.store(true, Ordering::SeqCst);
        self.state.write().await.transition(LifecycleState::Activated)?;
        tracing::info!(deleted = deleted.len(), "activated");

        Ok(ActivateReport { deleted, clients_claimed: true })
    }

    /// Activate now if installed and waiting.
    pub async fn skip_waiting(&self) -> Option<ActivateReport> {
        if !self.state().await.is_waiting() {
            tracing::debug!("skip_waiting ignored: no waiting worker");
            return None;
        }
        match self.on_activate().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("skip_waiting activation failed: {e}");
                None
            }
        }
    }

    /// Decide how an intercepted request is answered.
    pub async fn handle_fetch(&self, request: &Request) -> FetchDisposition {
        if !self.state().await.is_controlling() {
            return FetchDisposition::Passthrough;
        }

        let category = self.classifier.classify(request);
        let Some((strategy, kind)) = Strategy::for_category(category) else {
            tracing::trace!(url = %request.url, "excluded from interception");
            return FetchDisposition::Passthrough;
        };

        let store = self.registry.store_name(kind);
        tracing::debug!(url = %request.url, ?category, ?strategy, "intercepted");
        FetchDisposition::Respond(self.executor.execute(strategy, request, &store).await)
    }

    /// Handle a control message. Failures are logged, never returned.
    pub async fn handle_message(&self, message: ControlMessage, port: Option<ReplyPort>) {
        tracing::debug!(kind = message.kind(), "control message");
        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await;
            }
            ControlMessage::GetVersion => {
                let reply = VersionReply { version: self.version().to_string() };
                reply_to(port, "GET_VERSION", &reply);
            }
            ControlMessage::CacheUrl { url, cache_name } => {
                let store = cache_name.unwrap_or_else(|| self.registry.store_name(StoreKind::Dynamic));
                if let Err(e) = self.cache_url(&url, &store).await {
                    tracing::error!(url = %url, store = %store, "manual cache failed: {e}");
                }
            }
            ControlMessage::DeleteCache { cache_name } => match self.registry.delete_store(&cache_name).await {
                Ok(existed) => tracing::info!(store = %cache_name, existed, "cache deleted"),
                Err(e) => tracing::error!(store = %cache_name, "cache delete failed: {e}"),
            },
            ControlMessage::GetCacheInfo => match self.cache_info().await {
                Ok(info) => reply_to(port, "GET_CACHE_INFO", &info),
                Err(e) => tracing::error!("cache info failed: {e}"),
            },
        }
    }

    async fn cache_url(&self, url: &str, store: &str) -> Result<(), Error> {
        let request = self.resolve(url)?;
        let response = self.executor.refresh(&request, store).await?;
        if response.is_success() {
            tracing::info!(url = %request.url, store, "cached on request");
        } else {
            tracing::warn!(url = %request.url, status = response.status, "not cached: error response");
        }
        Ok(())
    }

    /// Entry count of every store, current generation or not.
    pub async fn cache_info(&self) -> Result<CacheInfo, Error> {
        let mut info = CacheInfo::new();
        for name in self.registry.list_store_names().await? {
            let count = self.registry.count_entries(&name).await?;
            info.insert(name, count);
        }
        Ok(info)
    }

    /// Handle a sync event. Unknown tags are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the dynamic store cannot be listed.
    pub async fn on_sync(&self, tag: &str) -> Result<Option<SyncReport>, Error> {
        if tag != BACKGROUND_SYNC_TAG {
            tracing::debug!(tag, "ignoring sync tag");
            return Ok(None);
        }

        let store = self.registry.store_name(StoreKind::Dynamic);
        let mut report = SyncReport { refreshed: 0, failed: 0 };
        for url in self.registry.list_entries(&store).await? {
            let outcome = match Request::parse_get(&url) {
                Ok(request) => self.executor.refresh(&request, &store).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(response) if response.is_success() => report.refreshed += 1,
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status, "sync kept stale entry");
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::debug!(url = %url, "sync refresh failed: {e}");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(refreshed = report.refreshed, failed = report.failed, "background sync done");
        Ok(Some(report))
    }

    /// Turn a push message into a notification to display.
    pub fn on_push(&self, payload: Option<&[u8]>) -> Result<Option<Notification>, Error> {
        notify::notification_for_push(payload)
    }

    pub fn on_notification_click(&self, action: Option<&str>, data: Option<&NotificationData>) -> ClickOutcome {
        notify::on_notification_click(action, data)
    }
}

fn reply_to(port: Option<ReplyPort>, kind: &str, payload: &impl Serialize) {
    match port {
        Some(port) => port.post(payload),
        None => tracing::debug!(kind, "no reply port; reply dropped"),
    }
}
