//! AlphaFold Protein Structure Database client.
//!
//! ### Endpoints
//!
//! - `GET /prediction/{qualifier}`: prediction metadata, optionally filtered
//!   by `sequence_checksum`
//! - `GET /uniprot/summary/{qualifier}.json`: UniProt entry plus structures
//! - `GET /annotations/{qualifier}?annotation_type=...`: residue annotations
//!
//! All calls go through [`ApiClient`], so they share its cache and retry policy.

pub mod types;

pub use types::{
    Annotation, AnnotationResponse, Entity, EntrySummary, Region, Structure, StructureSummary, UniprotEntry,
    UniprotSummaryResponse,
};

use serde_json::{Map, Value};

use foldmcp_core::Error;

use crate::http::{ApiClient, ApiRequest, ParsedResult, RequestBody};

/// Default base URL for the AlphaFold DB API.
pub const DEFAULT_BASE_URL: &str = "https://alphafold.ebi.ac.uk/api";

/// Annotation type used when the caller does not pick one.
pub const DEFAULT_ANNOTATION_TYPE: &str = "MUTAGEN";

/// Reject qualifiers that would escape their path segment.
///
/// Accessions, entry names and CRC64 checksums only use ASCII letters,
/// digits, `_`, `.` and `-`.
pub fn validate_qualifier(qualifier: &str) -> Result<(), Error> {
    if qualifier.is_empty() {
        return Err(Error::InvalidInput("qualifier cannot be empty".to_string()));
    }

    match qualifier.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))) {
        Some(c) => Err(Error::InvalidInput(format!("qualifier contains invalid character {c:?}: {qualifier}"))),
        None => Ok(()),
    }
}

#[derive(Clone)]
pub struct AlphaFoldClient {
    api: ApiClient,
    base_url: String,
}

impl AlphaFoldClient {
    pub fn new(api: ApiClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { api, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All AlphaFold models for a UniProt accession.
    pub async fn prediction(
        &self, qualifier: &str, sequence_checksum: Option<&str>,
    ) -> Result<ParsedResult<Vec<EntrySummary>>, Error> {
        validate_qualifier(qualifier)?;

        let mut request = ApiRequest::get(format!("{}/prediction/{}", self.base_url, qualifier));
        if let Some(checksum) = sequence_checksum {
            let mut params = Map::new();
            params.insert("sequence_checksum".to_string(), Value::String(checksum.to_string()));
            request = request.with_body(RequestBody::Raw(params));
        }

        tracing::debug!("fetching AlphaFold prediction: qualifier={}", qualifier);
        self.api.request_typed(request).await
    }

    /// UniProt entry and structure summaries.
    ///
    /// `qualifier` may be an accession, an entry name, or a CRC64 checksum.
    pub async fn uniprot_summary(&self, qualifier: &str) -> Result<ParsedResult<UniprotSummaryResponse>, Error> {
        validate_qualifier(qualifier)?;

        let request = ApiRequest::get(format!("{}/uniprot/summary/{}.json", self.base_url, qualifier));

        tracing::debug!("fetching UniProt summary: qualifier={}", qualifier);
        self.api.request_typed(request).await
    }

    /// Residue annotations of one type (e.g. `MUTAGEN` for AlphaMissense).
    pub async fn annotations(
        &self, qualifier: &str, annotation_type: Option<&str>,
    ) -> Result<ParsedResult<AnnotationResponse>, Error> {
        validate_qualifier(qualifier)?;

        let annotation_type = annotation_type.unwrap_or(DEFAULT_ANNOTATION_TYPE);
        if annotation_type.trim().is_empty() {
            return Err(Error::InvalidInput("annotation_type cannot be empty".to_string()));
        }

        let mut params = Map::new();
        params.insert("annotation_type".to_string(), Value::String(annotation_type.to_string()));
        let request = ApiRequest::get(format!("{}/annotations/{}", self.base_url, qualifier))
            .with_body(RequestBody::Raw(params));

        tracing::debug!("fetching annotations: qualifier={}, type={}", qualifier, annotation_type);
        self.api.request_typed(request).await
    }
}
