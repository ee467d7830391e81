use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

use carekb_cache::CacheLayer;
use carekb_core::config::RetrievalConfig;
use carekb_core::traits::{DocumentStore, EmbeddingProvider, VectorStore, WebDiscoveryProvider};
use carekb_core::types::{
    Document, DocumentType, GapKind, GapPriority, NewDocument, QualityTier, SourceClass,
    WebCandidate,
};
use carekb_embed::HashingProvider;
use carekb_improve::{ImprovementEngine, QueryCategory, StaticDiscoveryProvider};
use carekb_retrieval::RetrievalService;
use carekb_store::{MemoryDocumentStore, MemoryVectorStore};

/// Embedder with one axis per topic keyword; axis weight is the number
/// of keyword occurrences, so similarities are predictable.
struct TopicEmbedder {
    topics: Vec<&'static str>,
}

impl TopicEmbedder {
    fn new(topics: Vec<&'static str>) -> Self {
        Self { topics }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v = vec![0f32; self.topics.len() + 1];
        for (axis, keyword) in self.topics.iter().enumerate() {
            v[axis] = lower.matches(keyword).count() as f32;
        }
        if v.iter().all(|x| *x == 0.0) {
            v[self.topics.len()] = 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for TopicEmbedder {
    fn dim(&self) -> usize {
        self.topics.len() + 1
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}

fn engine_with(
    embedder: Arc<dyn EmbeddingProvider>,
    dim: usize,
    provider: Arc<dyn WebDiscoveryProvider>,
) -> (ImprovementEngine, Arc<MemoryDocumentStore>, Arc<MemoryVectorStore>, Arc<RetrievalService>)
{
    let docs = Arc::new(MemoryDocumentStore::new());
    let vectors = Arc::new(MemoryVectorStore::new(dim));
    let retrieval = Arc::new(RetrievalService::new(
        docs.clone(),
        vectors.clone(),
        embedder,
        CacheLayer::default(),
        RetrievalConfig::default(),
    ));
    let engine = ImprovementEngine::new(retrieval.clone(), docs.clone(), provider);
    (engine, docs, vectors, retrieval)
}

fn new_doc(title: &str, doc_type: DocumentType, content: &str) -> NewDocument {
    NewDocument {
        title: title.to_string(),
        doc_type,
        source: "clinical-governance".to_string(),
        url: None,
        content: content.to_string(),
        version: "1".to_string(),
        tags: vec![],
    }
}

fn candidate(
    title: &str,
    url: &str,
    relevance: f32,
    source_class: SourceClass,
    doc_type: DocumentType,
) -> WebCandidate {
    WebCandidate {
        title: title.to_string(),
        url: url.to_string(),
        content: String::new(),
        relevance,
        source_class,
        doc_type,
    }
}

#[tokio::test]
async fn zero_hits_yield_exactly_one_high_priority_missing_documentation_gap() {
    let (engine, _, _, _) = engine_with(
        Arc::new(HashingProvider::new(64)),
        64,
        Arc::new(StaticDiscoveryProvider::default()),
    );

    let report = engine
        .analyze("rare tropical parasitic infection", QueryCategory::General)
        .await;

    assert_eq!(report.gaps.len(), 1);
    assert_eq!(report.gaps[0].kind, GapKind::MissingDocumentation);
    assert_eq!(report.gaps[0].priority, GapPriority::High);
}

#[tokio::test]
async fn only_high_relevance_non_other_candidates_are_auto_ingested() {
    let provider = StaticDiscoveryProvider::new(vec![
        candidate(
            "Chest Pain Assessment Protocol",
            "https://health.example.gov/chest-pain",
            0.95,
            SourceClass::Official,
            DocumentType::Protocol,
        ),
        candidate(
            "Chest pain blog post",
            "https://blog.example.com/chest-pain",
            0.72,
            SourceClass::Other,
            DocumentType::Guideline,
        ),
    ]);
    let (engine, docs, vectors, _) =
        engine_with(Arc::new(HashingProvider::new(64)), 64, Arc::new(provider));

    let report = engine
        .analyze("chest pain assessment in clinic", QueryCategory::General)
        .await;

    assert_eq!(report.discovered_resources.len(), 1);
    let resource = &report.discovered_resources[0];
    assert_eq!(resource.url, "https://health.example.gov/chest-pain");
    assert!(resource.auto_ingestible);
    assert_eq!(resource.quality, QualityTier::High);

    let corpus = docs.list_active().await.expect("list");
    assert_eq!(corpus.len(), 1, "only the official candidate becomes a document");
    let created = &corpus[0];
    assert_eq!(created.url.as_deref(), Some("https://health.example.gov/chest-pain"));
    assert!(created.tags.contains(&"chest".to_string()));
    assert!(
        vectors.has_chunks(&created.id).await.expect("has"),
        "auto-ingested document must be indexed"
    );
}

#[tokio::test]
async fn sub_threshold_resources_are_kept_but_not_ingested() {
    let provider = StaticDiscoveryProvider::new(vec![
        candidate(
            "Palpitations Referral Guideline",
            "https://health.example.gov/palpitations",
            0.85,
            SourceClass::Government,
            DocumentType::Guideline,
        ),
        candidate(
            "Palpitations Review Standard",
            "https://authority.example.org/palpitations",
            0.75,
            SourceClass::MedicalAuthority,
            DocumentType::Protocol,
        ),
    ]);
    let (engine, docs, _, _) =
        engine_with(Arc::new(HashingProvider::new(64)), 64, Arc::new(provider));

    let report = engine
        .analyze("recurrent palpitations at rest", QueryCategory::Routine)
        .await;

    assert_eq!(report.discovered_resources.len(), 2);
    assert!(report.discovered_resources[0].relevance > report.discovered_resources[1].relevance);
    assert!(report.discovered_resources[0].auto_ingestible);
    assert!(!report.discovered_resources[1].auto_ingestible);

    let corpus = docs.list_active().await.expect("list");
    assert_eq!(corpus.len(), 1, "the 0.75 resource stays advisory");
}

#[tokio::test]
async fn thin_emergency_coverage_is_a_critical_gap() {
    let (engine, docs, _, retrieval) = engine_with(
        Arc::new(TopicEmbedder::new(vec!["chest pain"])),
        2,
        Arc::new(StaticDiscoveryProvider::default()),
    );
    let doc = docs
        .create(new_doc(
            "Acute Coronary Protocol",
            DocumentType::Protocol,
            "chest pain escalation criteria with chest pain observation intervals",
        ))
        .await
        .expect("create");
    assert!(retrieval.ingest_document(&doc.id).await);

    let report = engine.analyze("chest pain", QueryCategory::Emergency).await;

    let gap = report
        .gaps
        .iter()
        .find(|g| g.kind == GapKind::InsufficientCoverage)
        .expect("insufficient-coverage gap");
    assert_eq!(gap.priority, GapPriority::Critical);
}

#[tokio::test]
async fn specialist_query_without_protocol_results_is_a_specialty_gap() {
    let (engine, docs, _, retrieval) = engine_with(
        Arc::new(TopicEmbedder::new(vec!["dizziness"])),
        2,
        Arc::new(StaticDiscoveryProvider::default()),
    );
    let doc = docs
        .create(new_doc(
            "Dizziness Self-Care Guideline",
            DocumentType::Guideline,
            "dizziness advice covering hydration and dizziness triggers at home",
        ))
        .await
        .expect("create");
    assert!(retrieval.ingest_document(&doc.id).await);

    let report = engine.analyze("dizziness", QueryCategory::Specialist).await;

    let gap = report
        .gaps
        .iter()
        .find(|g| g.kind == GapKind::SpecialtyGap)
        .expect("specialty gap");
    assert_eq!(gap.priority, GapPriority::Medium);
}

#[tokio::test]
async fn mental_health_vocabulary_without_titled_coverage_is_a_high_gap() {
    let (engine, docs, _, retrieval) = engine_with(
        Arc::new(TopicEmbedder::new(vec!["anxiety"])),
        2,
        Arc::new(StaticDiscoveryProvider::default()),
    );
    let doc = docs
        .create(new_doc(
            "General Wellness Guideline",
            DocumentType::Guideline,
            "anxiety can accompany many presentations; note anxiety history during review",
        ))
        .await
        .expect("create");
    assert!(retrieval.ingest_document(&doc.id).await);

    let report = engine
        .analyze("worsening anxiety at night", QueryCategory::MentalHealth)
        .await;

    let gap = report
        .gaps
        .iter()
        .find(|g| g.kind == GapKind::SpecialtyGap)
        .expect("specialty gap");
    assert_eq!(gap.priority, GapPriority::High);
    assert!(gap.description.contains("anxiety"));
}

/// Delegating store that ages every document it returns from the batch
/// lookup, for exercising the stale-protocol rule.
struct AgedStore {
    inner: MemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for AgedStore {
    async fn create(&self, doc: NewDocument) -> anyhow::Result<Document> {
        self.inner.create(doc).await
    }

    async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Document>> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Document>> {
        let mut docs = self.inner.get_by_ids(ids).await?;
        for doc in &mut docs {
            doc.updated_at = doc.updated_at - Duration::days(500);
        }
        Ok(docs)
    }

    async fn get_by_type(&self, doc_type: DocumentType) -> anyhow::Result<Vec<Document>> {
        self.inner.get_by_type(doc_type).await
    }

    async fn get_by_tags(&self, tags: &[String]) -> anyhow::Result<Vec<Document>> {
        self.inner.get_by_tags(tags).await
    }

    async fn search_content(&self, needle: &str) -> anyhow::Result<Vec<Document>> {
        self.inner.search_content(needle).await
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Document>> {
        self.inner.list_active().await
    }

    async fn deactivate(&self, id: &str) -> anyhow::Result<()> {
        self.inner.deactivate(id).await
    }
}

#[tokio::test]
async fn stale_protocols_among_results_are_flagged_for_review() {
    let docs = Arc::new(AgedStore { inner: MemoryDocumentStore::new() });
    let vectors = Arc::new(MemoryVectorStore::new(2));
    let retrieval = Arc::new(RetrievalService::new(
        docs.clone(),
        vectors,
        Arc::new(TopicEmbedder::new(vec!["chest pain"])),
        CacheLayer::default(),
        RetrievalConfig::default(),
    ));
    let engine = ImprovementEngine::new(
        retrieval.clone(),
        docs.clone(),
        Arc::new(StaticDiscoveryProvider::default()),
    );
    let doc = docs
        .create(new_doc(
            "Legacy Chest Pain Protocol",
            DocumentType::Protocol,
            "chest pain pathway from a previous review cycle covering chest pain escalation",
        ))
        .await
        .expect("create");
    assert!(retrieval.ingest_document(&doc.id).await);

    let report = engine.analyze("chest pain", QueryCategory::Routine).await;

    let gap = report
        .gaps
        .iter()
        .find(|g| g.kind == GapKind::OutdatedProtocol)
        .expect("outdated-protocol gap");
    assert_eq!(gap.priority, GapPriority::Medium);
    assert!(gap.description.contains("Legacy Chest Pain Protocol"));
}

#[tokio::test]
async fn emergency_language_in_routine_query_is_flagged() {
    let (engine, _, _, _) = engine_with(
        Arc::new(HashingProvider::new(64)),
        64,
        Arc::new(StaticDiscoveryProvider::default()),
    );

    let report = engine
        .analyze("sudden crushing chest pain", QueryCategory::Routine)
        .await;

    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("under-triage")));
}
