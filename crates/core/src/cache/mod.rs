//! SQLite-backed cache for upstream API responses.
//!
//! This module provides a persistent key/value cache with per-entry expiry
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Deterministic request keys using SHA-256 hashing
//! - Expiry checked on every read
//! - Automatic schema migrations
//! - WAL mode for concurrent access from several processes

use async_trait::async_trait;

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod responses;

pub use crate::Error;

pub use connection::CacheDb;
pub use responses::CacheStats;

/// Key/value store the request orchestrator reads from and fills.
///
/// Implementations must never return an entry past its expiry.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Fetch a live body for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `body` under `key` for `ttl_seconds`. Overwrites any previous entry.
    async fn set(&self, key: &str, body: &str, ttl_seconds: u64) -> Result<(), Error>;
}
