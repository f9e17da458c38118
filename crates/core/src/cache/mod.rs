//! SQLite-backed cache stores.
//!
//! This module provides the persistent side of the engine: named stores of
//! request/response entries, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Version-tagged store names (`static-<tag>`, `dynamic-<tag>`, `runtime-<tag>`)
//! - Content-addressed entry keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod registry;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use registry::{CacheRegistry, StoreKind, VersionTag};
pub use stores::StoredEntry;
