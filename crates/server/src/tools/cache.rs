//! cache_purge tool implementation.
//!
//! Removes expired response cache entries, or every entry with `all`.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use foldmcp_core::{CacheDb, Error};

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete live entries too, not only expired ones.
    #[serde(default)]
    pub all: bool,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    /// Entries left in the cache.
    pub remaining: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let deleted = if params.all { cache.clear().await? } else { cache.purge_expired().await? };
    let remaining = cache.stats().await?.total;

    tracing::info!("purged {} cache entries ({} remaining)", deleted, remaining);

    let output = CachePurgeOutput { deleted, remaining };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
