//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::Error;
use crate::http::{Network, Request, Response};

/// Scripted network with a call counter.
///
/// Unknown URLs answer 404. `set_offline(true)` makes every fetch fail as if
/// connectivity were lost. `hold()` parks every fetch until permits are added
/// to the returned semaphore.
#[derive(Default)]
pub(crate) struct StubNetwork {
    responses: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_ok(self, url: &str, body: &str) -> Self {
        self.respond(url, Response::new(200, body.to_string()));
        self
    }

    pub(crate) fn with_status(self, url: &str, status: u16) -> Self {
        self.respond(url, Response::new(status, format!("status {status}")));
        self
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "not found")))
    }
}
