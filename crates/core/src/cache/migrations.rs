//! Response cache schema.
//!
//! Applied versions are recorded in `_migrations`; [`run`] applies every
//! entry of [`SCHEMA`] newer than the highest recorded one.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Schema steps in ascending version order.
const SCHEMA: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_response_cache.sql"))];

/// Bring the cache schema up to date.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in SCHEMA.iter().filter(|(version, _)| *version > applied) {
            tracing::info!(version, "upgrading response cache schema");
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
