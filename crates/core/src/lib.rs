//! Core types and the offline caching engine for swkit.
//!
//! This crate provides:
//! - Versioned cache stores with a SQLite backend
//! - Request classification and the three caching strategies
//! - Install/activate lifecycle and the control-message protocol
//! - Unified error types and layered configuration

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod http;
pub mod lifecycle;
pub mod messages;
pub mod notify;
pub mod strategy;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheDb, CacheRegistry, StoreKind, VersionTag};
pub use classify::{Category, Classifier};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Network, Request, Response};
pub use messages::{ControlMessage, ReplyPort};
pub use strategy::{Handled, Revalidation, Strategy};
pub use worker::{FetchDisposition, ServiceWorkerCore};
