//! Domain types shared by the ingestion, retrieval and improvement layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type DocumentId = String;
pub type ChunkId = String;

/// Classification of a corpus document. Drives the chunking profile and
/// the per-policy type filters at search time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Protocol,
    Guideline,
    Policy,
    Standard,
    Requirement,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Guideline => "guideline",
            Self::Policy => "policy",
            Self::Standard => "standard",
            Self::Requirement => "requirement",
        }
    }
}

/// A corpus document owned by the `DocumentStore`.
///
/// Documents are never physically deleted, only deactivated. They are
/// created either by explicit ingestion or by the improvement engine's
/// auto-ingestion of discovered resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub doc_type: DocumentType,
    pub source: String,
    pub url: Option<String>,
    pub content: String,
    pub version: String,
    pub tags: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a document; the store assigns id,
/// timestamps and the active flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub doc_type: DocumentType,
    pub source: String,
    pub url: Option<String>,
    pub content: String,
    pub version: String,
    pub tags: Vec<String>,
}

/// Denormalized document identity carried on every chunk so search-time
/// filtering does not need a store round-trip per hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub start_offset: usize,
    pub end_offset: usize,
    pub title: String,
    pub doc_type: DocumentType,
    pub source: String,
}

/// A chunk of a source document, the unit of embedding and retrieval.
///
/// - `id`: globally unique chunk identifier (`<doc_id>:<chunk_index>`)
/// - `document_id`: stable parent document identity
/// - `chunk_index`/`total_chunks`: position within the parent document;
///   indices are contiguous starting at 0
/// - `embedding`: fixed-dimension vector, same dimension corpus-wide
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub document_id: DocumentId,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
    pub created_at: DateTime<Utc>,
}

/// A raw nearest-neighbor hit as returned by the `VectorStore`.
///
/// `similarity` is cosine similarity clamped to `[0, 1]`; higher is
/// always better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

/// An enriched search result, ordered descending by similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub similarity: f32,
    pub document_id: DocumentId,
    pub title: String,
    pub doc_type: DocumentType,
    pub source: String,
}

/// Knobs for a single search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub limit: usize,
    pub threshold: f32,
    pub document_types: Option<Vec<DocumentType>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { limit: 5, threshold: 0.7, document_types: None }
    }
}

/// Assembled retrieval context for one query. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub summary: String,
    pub total_results: usize,
    pub took: Duration,
}

/// Operational snapshot of the index, cheap enough to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatus {
    pub total_documents: usize,
    pub indexed_documents: usize,
    pub total_chunks: usize,
    pub last_indexed: Option<DateTime<Utc>>,
}

/// Outcome counts of a bulk ingestion run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    MissingDocumentation,
    InsufficientCoverage,
    OutdatedProtocol,
    SpecialtyGap,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A detected deficiency in corpus coverage relative to an observed
/// query. Emitted per analysis call, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGap {
    pub kind: GapKind,
    pub description: String,
    pub priority: GapPriority,
    pub suggested_action: String,
}

/// Coarse authority classification of a discovered web source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    Official,
    Government,
    MedicalAuthority,
    Other,
}

impl SourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Government => "government",
            Self::MedicalAuthority => "medical_authority",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

/// A candidate web document as returned by the `WebDiscoveryProvider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebCandidate {
    pub title: String,
    pub url: String,
    pub content: String,
    pub relevance: f32,
    pub source_class: SourceClass,
    pub doc_type: DocumentType,
}

/// A scored external resource, ephemeral until promoted to a `Document`
/// by auto-ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub title: String,
    pub url: String,
    pub source_class: SourceClass,
    pub doc_type: DocumentType,
    pub relevance: f32,
    pub query: String,
    pub auto_ingestible: bool,
    pub quality: QualityTier,
}

/// Aggregate counters reported by a `VectorStore`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VectorStats {
    pub total_chunks: usize,
    pub indexed_documents: usize,
    pub last_created: Option<DateTime<Utc>>,
}
