//! uniprot_search tool implementation.

use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use foldmcp_client::{UniProtClient, UniProtSearchParams};

use super::{default_true, render};

/// Input parameters for uniprot_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// UniProt query, e.g. "gene:BRCA1 AND organism_id:9606".
    pub query: String,

    /// Comma-separated fields to return, e.g. "accession,gene_names".
    #[serde(default)]
    pub fields: Option<String>,

    /// Sort expression, e.g. "accession asc".
    #[serde(default)]
    pub sort: Option<String>,

    /// Results per page (1-500).
    #[serde(default)]
    pub size: Option<u32>,

    /// Return pretty JSON text (default) instead of structured content.
    #[serde(default = "default_true")]
    pub output_json: bool,
}

impl From<SearchParams> for UniProtSearchParams {
    fn from(params: SearchParams) -> Self {
        Self { query: params.query, fields: params.fields, sort: params.sort, size: params.size }
    }
}

pub async fn search_impl(client: &UniProtClient, params: SearchParams) -> CallToolResult {
    let output_json = params.output_json;
    let search = UniProtSearchParams::from(params);
    render(client.search(&search).await, output_json)
}
