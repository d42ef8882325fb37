//! UniProtKB REST search client.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use foldmcp_core::Error;

use crate::http::{ApiClient, ApiRequest, ParsedResult, RequestBody};

/// Default base URL for the UniProtKB REST API.
pub const DEFAULT_BASE_URL: &str = "https://rest.uniprot.org/uniprotkb";

/// Largest page size UniProt accepts.
const MAX_PAGE_SIZE: u32 = 500;

/// Query parameters for `/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UniProtSearchParams {
    /// UniProt query syntax, e.g. `gene:BRCA1 AND organism_id:9606`.
    pub query: String,

    /// Comma-separated return fields, e.g. `accession,gene_names`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,

    /// Sort expression, e.g. `accession asc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Results per page (1-500).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl UniProtSearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".to_string()));
        }

        if let Some(size) = self.size
            && !(1..=MAX_PAGE_SIZE).contains(&size)
        {
            return Err(Error::InvalidInput(format!("size must be between 1 and {MAX_PAGE_SIZE}, got {size}")));
        }

        Ok(())
    }
}

/// Wire form of a search: the caller's parameters plus the response format.
#[derive(Serialize)]
struct SearchQuery<'a> {
    #[serde(flatten)]
    params: &'a UniProtSearchParams,
    format: &'static str,
}

/// `/search` response. Entries are passed through untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UniProtSearchResponse {
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Clone)]
pub struct UniProtClient {
    api: ApiClient,
    base_url: String,
}

impl UniProtClient {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { api, base_url }
    }

    /// Full-text search over UniProtKB entries.
    pub async fn search(&self, params: &UniProtSearchParams) -> Result<ParsedResult<UniProtSearchResponse>, Error> {
        params.validate()?;

        let body = RequestBody::typed(&SearchQuery { params, format: "json" })?;
        let request = ApiRequest::get(format!("{}/search", self.base_url)).with_body(body);

        tracing::debug!("searching UniProtKB: query={}", params.query);
        self.api.request_typed(request).await
    }
}
