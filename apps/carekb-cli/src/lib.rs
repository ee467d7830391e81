//! Shared wiring for the command-line tools: tracing setup, service
//! construction from configuration, and corpus loading from a directory
//! of plain-text files.

use anyhow::Context as _;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

use carekb_cache::CacheLayer;
use carekb_core::config::EngineConfig;
use carekb_core::traits::EmbeddingProvider as _;
use carekb_core::types::{DocumentType, NewDocument};
use carekb_embed::get_default_provider;
use carekb_retrieval::RetrievalService;
use carekb_store::{MemoryDocumentStore, MemoryVectorStore};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Build a retrieval service over the in-memory backends from the
/// loaded configuration.
pub fn build_service(
    cfg: &EngineConfig,
) -> anyhow::Result<(Arc<RetrievalService>, Arc<MemoryDocumentStore>)> {
    let embedder = get_default_provider(&cfg.embedding)?;
    let docs = Arc::new(MemoryDocumentStore::new());
    let vectors = Arc::new(MemoryVectorStore::new(embedder.dim()));
    let service = Arc::new(RetrievalService::new(
        docs.clone(),
        vectors,
        embedder,
        CacheLayer::new(&cfg.cache),
        cfg.retrieval.clone(),
    ));
    Ok((service, docs))
}

fn doc_type_from_name(name: &str) -> DocumentType {
    let lower = name.to_lowercase();
    if lower.contains("protocol") {
        DocumentType::Protocol
    } else if lower.contains("policy") {
        DocumentType::Policy
    } else if lower.contains("standard") {
        DocumentType::Standard
    } else if lower.contains("requirement") {
        DocumentType::Requirement
    } else {
        DocumentType::Guideline
    }
}

/// Load every `.txt`/`.md` file under `dir` into the document store.
/// Returns how many documents were created.
pub async fn load_directory(docs: &MemoryDocumentStore, dir: &Path) -> anyhow::Result<usize> {
    use carekb_core::traits::DocumentStore as _;

    let mut created = 0;
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") | Some("md") => {}
            _ => continue,
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .replace(['_', '-'], " ");
        docs.create(NewDocument {
            doc_type: doc_type_from_name(&title),
            title,
            source: "local-corpus".to_string(),
            url: None,
            content,
            version: "1".to_string(),
            tags: vec![],
        })
        .await?;
        debug!(path = %path.display(), "loaded document");
        created += 1;
    }
    Ok(created)
}
