//! # Token Pool Library
//!
//! Requests attestation tokens from an external issuance authority in
//! rate-limited batches, caches them in a single JSON file pruned by expiry,
//! and serves the cached pool status over HTTP.
//!
//! Modules:
//! - `config` — service configuration, loading and validation
//! - `cache` — token record and the file-backed token store
//! - `issuer` — issuance authority client, adapter and diagnostics
//! - `pool` — batch planning and the pool manager
//! - `server` — axum routes exposing the pool manager

pub mod config;
pub mod cache;
pub mod error;
pub mod issuer;
pub mod pool;
pub mod observability;
pub mod server;
pub mod helpers;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::service::ServiceConfig;
pub use crate::error::{PoolError, PoolResult};
