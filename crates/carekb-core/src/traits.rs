//! Collaborator contracts required by the retrieval core.
//!
//! All I/O-bearing collaborators are async traits so production backends
//! (SQL stores, vector databases, HTTP providers) and in-memory fakes are
//! interchangeable. Implementations must be `Send + Sync`.

use async_trait::async_trait;

use crate::types::{
    Chunk, Document, DocumentType, NewDocument, RawHit, VectorStats, WebCandidate,
};

/// Persistence for document metadata and content.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document; the store assigns id, timestamps and the
    /// active flag.
    async fn create(&self, doc: NewDocument) -> anyhow::Result<Document>;

    async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Document>>;

    /// Batched fetch used for search-result enrichment. Missing ids are
    /// silently skipped; order of the result is unspecified.
    async fn get_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Document>>;

    async fn get_by_type(&self, doc_type: DocumentType) -> anyhow::Result<Vec<Document>>;

    /// Documents carrying at least one of the given tags.
    async fn get_by_tags(&self, tags: &[String]) -> anyhow::Result<Vec<Document>>;

    /// Case-insensitive substring search over document content.
    async fn search_content(&self, needle: &str) -> anyhow::Result<Vec<Document>>;

    async fn list_active(&self) -> anyhow::Result<Vec<Document>>;

    /// Documents are never deleted, only deactivated.
    async fn deactivate(&self, id: &str) -> anyhow::Result<()>;
}

/// Text-to-vector conversion, used by both ingestion and query paths.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimensionality (D), constant for this provider.
    fn dim(&self) -> usize;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Batch embedding, 1:1 and order-preserving with the input. Exists
    /// to amortize round-trips during ingestion of many chunks.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Persistence and nearest-neighbor search over chunk vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert all chunks for a document in one batched write.
    ///
    /// If the document already has chunks the call is a no-op returning 0,
    /// which keeps re-ingestion idempotent even if two callers race past
    /// the existence check. Every embedding is dimension-checked.
    async fn insert_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> anyhow::Result<usize>;

    async fn has_chunks(&self, document_id: &str) -> anyhow::Result<bool>;

    /// Remove all chunks for a document, returning how many were dropped.
    async fn delete_chunks(&self, document_id: &str) -> anyhow::Result<usize>;

    /// Hits with similarity >= `threshold`, best-first, at most `limit`.
    async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> anyhow::Result<Vec<RawHit>>;

    async fn stats(&self) -> anyhow::Result<VectorStats>;
}

/// External web search used by the improvement engine to find candidate
/// resources for detected knowledge gaps.
#[async_trait]
pub trait WebDiscoveryProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<WebCandidate>>;
}
