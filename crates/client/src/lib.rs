//! Network client for swkit.
//!
//! This crate provides the reqwest-backed implementation of the engine's
//! `Network` seam, plus URL handling shared with the server.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork, UrlError, canonicalize};
