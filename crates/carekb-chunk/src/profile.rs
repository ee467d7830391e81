use carekb_core::types::DocumentType;

/// Sizing and validation parameters for one chunking pass.
#[derive(Debug, Clone, Copy)]
pub struct ChunkProfile {
    /// Target upper bound on chunk size in bytes of original text.
    pub max_chars: usize,
    /// Overlap carried between adjacent chunks.
    pub overlap: usize,
    /// Chunks shorter than this after cleaning are dropped.
    pub min_chunk_chars: usize,
    /// Minimum share of alphanumeric characters; anything below is
    /// treated as boilerplate and dropped.
    pub min_informative_ratio: f32,
}

impl ChunkProfile {
    /// High-precision retrieval of protocol/guideline text.
    pub fn dense() -> Self {
        Self { max_chars: 800, overlap: 100, min_chunk_chars: 50, min_informative_ratio: 0.3 }
    }

    /// Policy text, where surrounding context matters more than precision.
    pub fn wide() -> Self {
        Self { max_chars: 1200, overlap: 200, min_chunk_chars: 50, min_informative_ratio: 0.3 }
    }
}

/// Profile keyed by document type: protocols and guidelines retrieve at
/// higher precision, policy-like documents keep more context per chunk.
pub fn profile_for(doc_type: DocumentType) -> ChunkProfile {
    match doc_type {
        DocumentType::Protocol | DocumentType::Guideline => ChunkProfile::dense(),
        DocumentType::Policy | DocumentType::Standard | DocumentType::Requirement => {
            ChunkProfile::wide()
        }
    }
}
