//! Response cache operations.
//!
//! Stores raw upstream bodies with an absolute expiry in unix milliseconds.
//! Expired rows stay on disk until purged but are never returned.

use super::{ResponseCache, connection::CacheDb};
use crate::Error;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Entry counts for the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: u64,
    pub live: u64,
}

fn expiry_ms(now_ms: i64, ttl_seconds: u64) -> i64 {
    let ttl_ms = i64::try_from(ttl_seconds).unwrap_or(i64::MAX).saturating_mul(1000);
    now_ms.saturating_add(ttl_ms)
}

impl CacheDb {
    /// Get a live cached body by key hash.
    ///
    /// Returns None if the key doesn't exist or the entry has expired.
    pub async fn get_response(&self, key_hash: &str) -> Result<Option<String>, Error> {
        let key_hash = key_hash.to_string();
        let now_ms = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT body FROM response_cache WHERE key_hash = ?1 AND expires_at_ms > ?2")?;

                let result = stmt.query_row(params![key_hash, now_ms], |row| row.get(0));

                match result {
                    Ok(body) => Ok(Some(body)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a cached body.
    ///
    /// Uses UPSERT semantics so the last writer for a key wins.
    pub async fn put_response(&self, key_hash: &str, body: &str, ttl_seconds: u64) -> Result<(), Error> {
        let key_hash = key_hash.to_string();
        let body = body.to_string();

        let now = Utc::now();
        let created_at = now.to_rfc3339();
        let expires_at_ms = expiry_ms(now.timestamp_millis(), ttl_seconds);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO response_cache (key_hash, body, created_at, expires_at_ms)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        body = excluded.body,
                        created_at = excluded.created_at,
                        expires_at_ms = excluded.expires_at_ms",
                    params![key_hash, body, created_at, expires_at_ms],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now_ms = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM response_cache WHERE expires_at_ms <= ?1", params![now_ms])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry, live or not.
    pub async fn clear(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM response_cache", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count total and live entries.
    pub async fn stats(&self) -> Result<CacheStats, Error> {
        let now_ms = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<CacheStats, Error> {
                let (total, live): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(CASE WHEN expires_at_ms > ?1 THEN 1 ELSE 0 END), 0)
                     FROM response_cache",
                    params![now_ms],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(CacheStats { total: total as u64, live: live as u64 })
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl ResponseCache for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.get_response(key).await
    }

    async fn set(&self, key: &str, body: &str, ttl_seconds: u64) -> Result<(), Error> {
        self.put_response(key, body, ttl_seconds).await
    }
}
