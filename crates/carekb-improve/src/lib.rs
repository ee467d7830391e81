//! Continuous corpus improvement: gap detection over observed queries,
//! external resource discovery, quality scoring and selective
//! auto-ingestion of high-confidence finds.
//!
//! The engine is stateless across calls; every `analyze` run works only
//! from its inputs and the current corpus.

mod autoingest;
mod discovery;
mod gaps;
mod patterns;
mod recommend;

pub use discovery::{HttpDiscoveryProvider, StaticDiscoveryProvider};
pub use patterns::QueryCategory;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use carekb_core::traits::{DocumentStore, WebDiscoveryProvider};
use carekb_core::types::{DiscoveredResource, KnowledgeGap};
use carekb_retrieval::RetrievalService;

/// Everything one analysis run produced. Ephemeral advisory output;
/// nothing here is persisted by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub gaps: Vec<KnowledgeGap>,
    pub discovered_resources: Vec<DiscoveredResource>,
    pub recommendations: Vec<String>,
}

/// Analyzes a query against the corpus, finds coverage gaps, discovers
/// candidate resources on the web and ingests the best of them.
///
/// Collaborators are injected; tests substitute in-memory fakes for the
/// document store and a canned discovery provider.
pub struct ImprovementEngine {
    retrieval: Arc<RetrievalService>,
    docs: Arc<dyn DocumentStore>,
    discovery: Arc<dyn WebDiscoveryProvider>,
}

impl ImprovementEngine {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        docs: Arc<dyn DocumentStore>,
        discovery: Arc<dyn WebDiscoveryProvider>,
    ) -> Self {
        Self { retrieval, docs, discovery }
    }

    /// Run the full analysis pipeline for one observed query: keyword
    /// extraction, gap detection, web discovery, auto-ingestion and
    /// advisory recommendations. Never fails; every stage degrades to
    /// an empty contribution on error.
    pub async fn analyze(&self, query: &str, category: QueryCategory) -> AnalysisReport {
        let keywords = patterns::extract_keywords(query);
        let gaps = self.detect_gaps(query, category).await;

        let queries = discovery::build_queries(category, &keywords);
        let discovered_resources = self.discover(&queries).await;
        let ingested = self.auto_ingest(&discovered_resources).await;

        let corpus_size = self.docs.list_active().await.map(|d| d.len()).ok();
        let recommendations =
            recommend::recommendations(query, category, &gaps, corpus_size);

        info!(
            query,
            gaps = gaps.len(),
            discovered = discovered_resources.len(),
            ingested,
            "analysis finished"
        );
        AnalysisReport { gaps, discovered_resources, recommendations }
    }

    pub(crate) fn retrieval(&self) -> &Arc<RetrievalService> {
        &self.retrieval
    }

    pub(crate) fn docs(&self) -> &Arc<dyn DocumentStore> {
        &self.docs
    }

    pub(crate) fn provider(&self) -> &Arc<dyn WebDiscoveryProvider> {
        &self.discovery
    }
}
