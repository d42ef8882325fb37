//! Upstream clients for mcp-alphafold.
//!
//! This crate provides the cached, retrying HTTP pipeline and the AlphaFold
//! and UniProt clients built on it.

pub mod alphafold;
pub mod http;
pub mod uniprot;

pub use alphafold::{AlphaFoldClient, AnnotationResponse, EntrySummary, UniprotSummaryResponse};
pub use http::{
    ApiClient, ApiRequest, ClientSettings, ParsedResult, RequestBody, RequestError, RetryPolicy, TlsVersion,
};
pub use uniprot::{UniProtClient, UniProtSearchParams, UniProtSearchResponse};
