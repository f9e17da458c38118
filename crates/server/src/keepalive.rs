//! Pending background work the host must outlive.

use std::sync::Arc;

use swkit_core::Revalidation;
use tokio::sync::Mutex;

/// Revalidations started by stale-while-revalidate that have not settled yet.
#[derive(Debug, Clone, Default)]
pub struct KeepAlive {
    pending: Arc<Mutex<Vec<Revalidation>>>,
}

impl KeepAlive {
    /// Track a revalidation, forgetting any that already finished.
    pub async fn hold(&self, revalidation: Revalidation) {
        let mut pending = self.pending.lock().await;
        pending.retain(|r| !r.is_finished());
        tracing::debug!(url = revalidation.url(), pending = pending.len() + 1, "holding revalidation");
        pending.push(revalidation);
    }

    /// Wait for every tracked revalidation. Returns how many refreshed the store.
    pub async fn drain(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        let total = pending.len();
        let mut refreshed = 0;
        for revalidation in pending {
            if revalidation.settled().await.is_some_and(|r| r.is_success()) {
                refreshed += 1;
            }
        }
        tracing::info!(total, refreshed, "drained pending revalidations");
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::active_core;
    use swkit_core::{Request, Response};

    #[tokio::test]
    async fn test_drain_empty() {
        assert_eq!(KeepAlive::default().drain().await, 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_pending() {
        let core = active_core(&[("https://site.test/", "home"), ("https://site.test/blog/a", "fresh")]).await;
        let request = Request::parse_get("https://site.test/blog/a").unwrap();
        core.registry()
            .put("runtime-v1", &request, &Response::new(200, "stale"))
            .await
            .unwrap();
        let keepalive = KeepAlive::default();

        let swkit_core::FetchDisposition::Respond(handled) = core.handle_fetch(&request).await else {
            panic!("expected a response");
        };
        keepalive.hold(handled.revalidation.unwrap()).await;

        assert_eq!(keepalive.drain().await, 1);
        assert_eq!(keepalive.drain().await, 0);
    }
}
