use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use carekb_core::similarity::clamped_cosine;
use carekb_core::traits::VectorStore;
use carekb_core::types::{Chunk, RawHit, VectorStats};
use carekb_core::Error;

/// In-memory `VectorStore` with brute-force cosine search.
///
/// Chunks are grouped by parent document; `insert_chunks` for a document
/// that already has chunks is a no-op, which makes re-ingestion safe even
/// when two callers race past the existence check.
pub struct MemoryVectorStore {
    dim: usize,
    chunks: RwLock<HashMap<String, Vec<Chunk>>>,
}

impl MemoryVectorStore {
    pub fn new(dim: usize) -> Self {
        Self { dim, chunks: RwLock::new(HashMap::new()) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// All chunks currently held for a document, in index order.
    pub async fn chunks_for(&self, document_id: &str) -> Vec<Chunk> {
        self.chunks
            .read()
            .await
            .get(document_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_chunks(&self, document_id: &str, chunks: Vec<Chunk>) -> anyhow::Result<usize> {
        for chunk in &chunks {
            if chunk.embedding.len() != self.dim {
                return Err(Error::DimensionMismatch {
                    expected: self.dim,
                    got: chunk.embedding.len(),
                }
                .into());
            }
        }
        let mut map = self.chunks.write().await;
        if map.contains_key(document_id) {
            debug!(document_id, "chunks already present, skipping insert");
            return Ok(0);
        }
        let count = chunks.len();
        map.insert(document_id.to_string(), chunks);
        Ok(count)
    }

    async fn has_chunks(&self, document_id: &str) -> anyhow::Result<bool> {
        Ok(self.chunks.read().await.contains_key(document_id))
    }

    async fn delete_chunks(&self, document_id: &str) -> anyhow::Result<usize> {
        let mut map = self.chunks.write().await;
        Ok(map.remove(document_id).map(|c| c.len()).unwrap_or(0))
    }

    async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> anyhow::Result<Vec<RawHit>> {
        if embedding.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                got: embedding.len(),
            }
            .into());
        }
        let map = self.chunks.read().await;
        let mut hits: Vec<RawHit> = map
            .values()
            .flatten()
            .filter_map(|chunk| {
                let similarity = clamped_cosine(embedding, &chunk.embedding);
                if similarity >= threshold {
                    Some(RawHit {
                        chunk_id: chunk.id.clone(),
                        document_id: chunk.document_id.clone(),
                        content: chunk.content.clone(),
                        metadata: chunk.metadata.clone(),
                        similarity,
                    })
                } else {
                    None
                }
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn stats(&self) -> anyhow::Result<VectorStats> {
        let map = self.chunks.read().await;
        let total_chunks = map.values().map(Vec::len).sum();
        let last_created = map
            .values()
            .flatten()
            .map(|c| c.created_at)
            .max();
        Ok(VectorStats {
            total_chunks,
            indexed_documents: map.len(),
            last_created,
        })
    }
}
