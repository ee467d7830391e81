//! Ingestion pipeline: fetch document, chunk by type profile, batch-embed
//! and persist in one write. Failures are soft per document; bulk runs
//! report counts instead of aborting.

use anyhow::bail;
use chrono::Utc;
use tracing::{debug, info, warn};

use carekb_chunk::{chunk, profile_for};
use carekb_core::traits::{DocumentStore as _, EmbeddingProvider as _, VectorStore as _};
use carekb_core::types::{Chunk, ChunkMetadata, Document, IngestReport};

use crate::RetrievalService;

impl RetrievalService {
    /// Ingest one document into the vector index.
    ///
    /// Returns `true` when the document ends up indexed (including the
    /// already-indexed short-circuit), `false` on any soft failure:
    /// unknown id, inactive document, content that yields no usable
    /// chunks, or a provider/store error.
    pub async fn ingest_document(&self, id: &str) -> bool {
        match self.try_ingest(id).await {
            Ok(indexed) => indexed,
            Err(err) => {
                warn!(document_id = id, error = %err, "ingestion failed");
                false
            }
        }
    }

    /// Ingest every active document. Per-document failures are counted,
    /// never propagated.
    pub async fn ingest_all(&self) -> IngestReport {
        let docs = match self.docs().list_active().await {
            Ok(docs) => docs,
            Err(err) => {
                warn!(error = %err, "could not list documents for bulk ingestion");
                return IngestReport::default();
            }
        };
        let mut report = IngestReport::default();
        for doc in docs {
            if self.ingest_document(&doc.id).await {
                report.success += 1;
            } else {
                report.failed += 1;
            }
        }
        info!(success = report.success, failed = report.failed, "bulk ingestion finished");
        report
    }

    async fn try_ingest(&self, id: &str) -> anyhow::Result<bool> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let Some(doc) = self.docs().get_by_id(id).await? else {
            bail!("document not found");
        };
        if !doc.active {
            bail!("document is inactive");
        }
        // Idempotency is existence-based, not content-aware: a document
        // with chunks is done, whatever its current content says.
        if self.vectors().has_chunks(id).await? {
            debug!(document_id = id, "already indexed, skipping");
            return Ok(true);
        }

        let profile = profile_for(doc.doc_type);
        let pieces = chunk(&doc.content, &profile);
        if pieces.is_empty() {
            warn!(document_id = id, "document produced no usable chunks");
            return Ok(false);
        }

        let texts: Vec<String> = pieces.iter().map(|p| p.content.clone()).collect();
        let embeddings = self.embedder().embed_batch(&texts).await?;
        if embeddings.len() != pieces.len() {
            bail!(
                "embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                pieces.len()
            );
        }

        let chunks = build_chunks(&doc, pieces, embeddings);
        let inserted = self.vectors().insert_chunks(id, chunks).await?;
        self.cache().invalidate_everywhere(id);
        self.cache().invalidate(carekb_cache::GENERAL, "index_status");
        info!(document_id = id, chunks = inserted, "document ingested");
        Ok(true)
    }
}

fn build_chunks(
    doc: &Document,
    pieces: Vec<carekb_chunk::ChunkPiece>,
    embeddings: Vec<Vec<f32>>,
) -> Vec<Chunk> {
    let now = Utc::now();
    pieces
        .into_iter()
        .zip(embeddings)
        .map(|(piece, embedding)| Chunk {
            id: format!("{}:{}", doc.id, piece.chunk_index),
            document_id: doc.id.clone(),
            chunk_index: piece.chunk_index,
            total_chunks: piece.total_chunks,
            content: piece.content,
            embedding,
            metadata: ChunkMetadata {
                start_offset: piece.start_offset,
                end_offset: piece.end_offset,
                title: doc.title.clone(),
                doc_type: doc.doc_type,
                source: doc.source.clone(),
            },
            created_at: now,
        })
        .collect()
}
