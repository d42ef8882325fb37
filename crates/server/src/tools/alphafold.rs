//! AlphaFold DB tools: predictions, UniProt summaries, and annotations.

use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use foldmcp_client::AlphaFoldClient;

use super::{default_true, render};

/// Parameters for the alphafold_prediction tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionParams {
    /// UniProt accession (e.g. "Q5VSL9").
    pub qualifier: String,

    /// CRC64 checksum of the UniProt sequence.
    #[serde(default)]
    pub sequence_checksum: Option<String>,

    /// Return pretty JSON text (default) instead of structured content.
    #[serde(default = "default_true")]
    pub output_json: bool,
}

/// Parameters for the uniprot_summary tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryParams {
    /// UniProtKB accession, entry name, or CRC64 checksum of the sequence.
    pub qualifier: String,

    /// Return pretty JSON text (default) instead of structured content.
    #[serde(default = "default_true")]
    pub output_json: bool,
}

/// Parameters for the uniprot_annotations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationsParams {
    /// UniProt accession.
    pub qualifier: String,

    /// Annotation type (default "MUTAGEN", AlphaMissense substitutions).
    #[serde(default)]
    pub annotation_type: Option<String>,

    /// Return pretty JSON text (default) instead of structured content.
    #[serde(default = "default_true")]
    pub output_json: bool,
}

pub async fn prediction_impl(client: &AlphaFoldClient, params: PredictionParams) -> CallToolResult {
    let outcome = client
        .prediction(&params.qualifier, params.sequence_checksum.as_deref())
        .await;
    render(outcome, params.output_json)
}

pub async fn summary_impl(client: &AlphaFoldClient, params: SummaryParams) -> CallToolResult {
    render(client.uniprot_summary(&params.qualifier).await, params.output_json)
}

pub async fn annotations_impl(client: &AlphaFoldClient, params: AnnotationsParams) -> CallToolResult {
    let outcome = client
        .annotations(&params.qualifier, params.annotation_type.as_deref())
        .await;
    render(outcome, params.output_json)
}
