//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::alphafold::{
    AnnotationsParams, PredictionParams, SummaryParams, annotations_impl, prediction_impl, summary_impl,
};
use crate::tools::cache::{CachePurgeParams, purge_impl};
use crate::tools::uniprot::{SearchParams, search_impl};

use foldmcp_client::{AlphaFoldClient, UniProtClient};
use foldmcp_core::CacheDb;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mcp-alphafold.
#[derive(Clone)]
pub struct AlphaFoldServer {
    tool_router: ToolRouter<Self>,
    alphafold: AlphaFoldClient,
    uniprot: UniProtClient,
    cache: Arc<CacheDb>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl AlphaFoldServer {
    /// Create a new server handler.
    pub fn new(alphafold: AlphaFoldClient, uniprot: UniProtClient, cache: Arc<CacheDb>) -> Self {
        Self { tool_router: Self::tool_router(), alphafold, uniprot, cache }
    }

    #[tool(
        description = "Get all AlphaFold models for a UniProt accession. Returns prediction metadata including model and PAE file URLs."
    )]
    async fn alphafold_prediction(&self, params: Parameters<PredictionParams>) -> Result<CallToolResult, McpError> {
        Ok(prediction_impl(&self.alphafold, params.0).await)
    }

    #[tool(
        description = "Get the UniProt entry and structure summaries for a protein by accession, entry name, or CRC64 checksum."
    )]
    async fn uniprot_summary(&self, params: Parameters<SummaryParams>) -> Result<CallToolResult, McpError> {
        Ok(summary_impl(&self.alphafold, params.0).await)
    }

    #[tool(description = "Get residue annotations for a UniProt accession (default type MUTAGEN, AlphaMissense scores).")]
    async fn uniprot_annotations(&self, params: Parameters<AnnotationsParams>) -> Result<CallToolResult, McpError> {
        Ok(annotations_impl(&self.alphafold, params.0).await)
    }

    #[tool(description = "Search UniProtKB entries with UniProt query syntax. Supports field selection, sort, and size.")]
    async fn uniprot_search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        Ok(search_impl(&self.uniprot, params.0).await)
    }

    /// Purge the response cache.
    #[tool(description = "Remove expired entries from the response cache, or every entry when all=true.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for AlphaFoldServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-alphafold".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "AlphaFold DB and UniProt lookups. Failed lookups return {\"error\": \"<code>: <message>\"}.".into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
