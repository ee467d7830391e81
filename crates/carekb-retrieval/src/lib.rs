//! Retrieval orchestration: ingestion pipeline, cache-wrapped similarity
//! search, context assembly and per-use-case retrieval policies.

mod ingest;
mod search;
mod status;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use carekb_cache::CacheLayer;
use carekb_core::config::RetrievalConfig;
use carekb_core::traits::{DocumentStore, EmbeddingProvider, VectorStore};

/// Orchestrates the document stores, the embedding provider and the
/// cache. Collaborators are injected so tests can substitute fakes.
pub struct RetrievalService {
    docs: Arc<dyn DocumentStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    cache: CacheLayer,
    cfg: RetrievalConfig,
    // Serializes concurrent ingestion of the same document id, closing
    // the gap between the "chunks exist?" check and the chunk write.
    ingest_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RetrievalService {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        cache: CacheLayer,
        cfg: RetrievalConfig,
    ) -> Self {
        Self {
            docs,
            vectors,
            embedder,
            cache,
            cfg,
            ingest_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.cfg
    }

    pub(crate) fn docs(&self) -> &Arc<dyn DocumentStore> {
        &self.docs
    }

    pub(crate) fn vectors(&self) -> &Arc<dyn VectorStore> {
        &self.vectors
    }

    pub(crate) fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub(crate) async fn lock_for(&self, document_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.ingest_locks.lock().await;
        locks
            .entry(document_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
