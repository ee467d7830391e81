//! Operational surface: index status reporting and explicit
//! invalidation paths.

use std::time::Duration;
use tracing::info;

use carekb_core::traits::{DocumentStore as _, VectorStore as _};
use carekb_core::types::IndexStatus;

use crate::RetrievalService;

impl RetrievalService {
    /// Snapshot of the index, cached briefly; used for dashboards and
    /// health checks, not correctness.
    pub async fn index_status(&self) -> anyhow::Result<IndexStatus> {
        let ttl = Duration::from_secs(self.config().status_ttl_secs);
        self.cache()
            .get_or_set(carekb_cache::GENERAL, "index_status", &(), Some(ttl), || async {
                let documents = self.docs().list_active().await?;
                let vectors = self.vectors().stats().await?;
                Ok(IndexStatus {
                    total_documents: documents.len(),
                    indexed_documents: vectors.indexed_documents,
                    total_chunks: vectors.total_chunks,
                    last_indexed: vectors.last_created,
                })
            })
            .await
    }

    /// Drop a document from retrieval: delete its chunks, deactivate the
    /// document and invalidate every cache entry referencing it.
    pub async fn remove_document(&self, id: &str) -> anyhow::Result<()> {
        let dropped = self.vectors().delete_chunks(id).await?;
        self.docs().deactivate(id).await?;
        let invalidated = self.cache().invalidate_everywhere(id);
        // Status snapshots are stale the moment the index shrinks.
        self.cache().invalidate(carekb_cache::GENERAL, "index_status");
        info!(document_id = id, chunks = dropped, cache_entries = invalidated, "document removed");
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache().invalidate_all();
    }
}
