//! AlphaFold DB response schemas.
//!
//! Enumerated upstream fields (entity types, model categories, and so on)
//! are kept as strings so new upstream values do not break deserialization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One structure prediction from `/prediction/{qualifier}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntrySummary {
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_version_date: Option<String>,
    pub uniprot_accession: String,
    pub uniprot_id: String,
    pub uniprot_description: String,
    pub tax_id: i64,
    pub organism_scientific_name: String,
    pub uniprot_start: i64,
    pub uniprot_end: i64,
    pub uniprot_sequence: String,
    pub model_created_date: String,
    pub latest_version: i64,
    pub all_versions: Vec<i64>,
    pub bcif_url: String,
    pub cif_url: String,
    pub pdb_url: String,
    pub pae_image_url: String,
    pub pae_doc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub am_annotations_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub am_annotations_hg19_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub am_annotations_hg38_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reviewed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reference_proteome: Option<bool>,
}

/// `/uniprot/summary/{qualifier}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UniprotSummaryResponse {
    pub uniprot_entry: UniprotEntry,
    pub structures: Vec<Structure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UniprotEntry {
    /// UniProt accession.
    pub ac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// CRC64 checksum of the sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Structure {
    pub summary: StructureSummary,
}

/// 3D-Beacons structure summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructureSummary {
    pub model_identifier: String,
    /// e.g. `TEMPLATE-BASED`, `AB-INITIO`
    pub model_category: String,
    pub model_url: String,
    /// `PDB`, `MMCIF` or `BCIF`
    pub model_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_page_url: Option<String>,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_conformers: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble_sample_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble_sample_format: Option<String>,
    /// Release date, `YYYY-MM-DD`.
    pub created: String,
    /// In `[0, 1]`.
    pub sequence_identity: f64,
    pub uniprot_start: i64,
    pub uniprot_end: i64,
    /// Fraction of the UniProt sequence covered, in `[0, 1]`.
    pub coverage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experimental_method: Option<String>,
    /// Angstrom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    /// `pLDDT` or `QMEANDisCo`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_version: Option<String>,
    pub confidence_avg_local_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oligomeric_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_assembly_id: Option<String>,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Entity {
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_poly_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier_category: Option<String>,
    pub description: String,
    pub chain_ids: Vec<String>,
}

/// `/annotations/{qualifier}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnnotationResponse {
    pub accession: String,
    pub id: String,
    pub sequence: String,
    pub annotation: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Annotation {
    /// Annotation type, currently only `MUTAGEN`.
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residues: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    pub start: i64,
    pub end: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_value: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}
