//! Rule-based knowledge-gap detection.
//!
//! Gaps are derived from a fresh corpus search at a loose threshold, so
//! detection sees what a real retrieval call would see. Detection never
//! propagates errors; an internal failure collapses to a single generic
//! gap so the caller's analysis still completes.

use chrono::{Duration, Utc};
use tracing::warn;

use carekb_core::traits::DocumentStore as _;
use carekb_core::types::{
    DocumentType, GapKind, GapPriority, KnowledgeGap, SearchOptions, SearchResult,
};

use crate::patterns::{self, QueryCategory};
use crate::ImprovementEngine;

/// Emergency queries need at least this many supporting passages.
const EMERGENCY_MIN_RESULTS: usize = 3;

/// A protocol untouched for this long is flagged for review.
const STALE_PROTOCOL_DAYS: i64 = 365;

impl ImprovementEngine {
    pub(crate) async fn detect_gaps(
        &self,
        query: &str,
        category: QueryCategory,
    ) -> Vec<KnowledgeGap> {
        match self.try_detect_gaps(query, category).await {
            Ok(gaps) => gaps,
            Err(err) => {
                warn!(query, error = %err, "gap detection failed");
                vec![KnowledgeGap {
                    kind: GapKind::MissingDocumentation,
                    description: format!("Coverage for \"{}\" could not be assessed.", query),
                    priority: GapPriority::Medium,
                    suggested_action: "Re-run the analysis once the knowledge base is reachable."
                        .into(),
                }]
            }
        }
    }

    async fn try_detect_gaps(
        &self,
        query: &str,
        category: QueryCategory,
    ) -> anyhow::Result<Vec<KnowledgeGap>> {
        // Detection probes looser than production retrieval; stricter
        // and near-misses would masquerade as missing documentation.
        let cfg = self.retrieval().config();
        let options = SearchOptions {
            limit: cfg.gap_limit,
            threshold: cfg.gap_threshold,
            document_types: None,
        };
        let results = self.retrieval().search_documents(query, &options).await;

        if results.is_empty() {
            return Ok(vec![KnowledgeGap {
                kind: GapKind::MissingDocumentation,
                description: format!("No corpus document covers \"{}\".", query),
                priority: GapPriority::High,
                suggested_action: format!("Source and ingest documentation for \"{}\".", query),
            }]);
        }

        let mut gaps = Vec::new();

        if category == QueryCategory::Emergency && results.len() < EMERGENCY_MIN_RESULTS {
            gaps.push(KnowledgeGap {
                kind: GapKind::InsufficientCoverage,
                description: format!(
                    "Only {} passage(s) support the emergency query \"{}\".",
                    results.len(),
                    query
                ),
                priority: GapPriority::Critical,
                suggested_action: "Ingest additional emergency protocols for this presentation."
                    .into(),
            });
        }

        if category == QueryCategory::Specialist
            && !results.iter().any(|r| r.doc_type == DocumentType::Protocol)
        {
            gaps.push(KnowledgeGap {
                kind: GapKind::SpecialtyGap,
                description: format!(
                    "Specialist query \"{}\" matched no protocol-grade document.",
                    query
                ),
                priority: GapPriority::Medium,
                suggested_action: "Add a specialist referral protocol for this presentation."
                    .into(),
            });
        }

        if patterns::has_mental_health_language(query)
            && !results
                .iter()
                .any(|r| patterns::has_mental_health_language(&r.title))
        {
            gaps.push(KnowledgeGap {
                kind: GapKind::SpecialtyGap,
                description: format!(
                    "Mental-health query \"{}\" matched no mental-health-titled document.",
                    query
                ),
                priority: GapPriority::High,
                suggested_action: "Ingest dedicated mental-health protocols and guidelines."
                    .into(),
            });
        }

        if patterns::has_aviation_language(query)
            && !results
                .iter()
                .any(|r| patterns::has_aviation_language(&r.title))
        {
            gaps.push(KnowledgeGap {
                kind: GapKind::SpecialtyGap,
                description: format!(
                    "Aviation-medicine query \"{}\" matched no aviation-titled document.",
                    query
                ),
                priority: GapPriority::High,
                suggested_action: "Ingest aeromedical standards for this presentation.".into(),
            });
        }

        gaps.extend(self.stale_protocol_gaps(&results).await?);
        Ok(gaps)
    }

    /// Matched protocols that have not been updated in over a year.
    async fn stale_protocol_gaps(
        &self,
        results: &[SearchResult],
    ) -> anyhow::Result<Vec<KnowledgeGap>> {
        let mut ids: Vec<String> = Vec::new();
        for result in results {
            if result.doc_type == DocumentType::Protocol
                && !ids.contains(&result.document_id)
            {
                ids.push(result.document_id.clone());
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cutoff = Utc::now() - Duration::days(STALE_PROTOCOL_DAYS);
        let documents = self.docs().get_by_ids(&ids).await?;
        Ok(documents
            .into_iter()
            .filter(|doc| doc.updated_at < cutoff)
            .map(|doc| KnowledgeGap {
                kind: GapKind::OutdatedProtocol,
                description: format!(
                    "Protocol \"{}\" has not been updated since {}.",
                    doc.title,
                    doc.updated_at.format("%Y-%m-%d")
                ),
                priority: GapPriority::Medium,
                suggested_action: format!("Review and re-issue \"{}\".", doc.title),
            })
            .collect())
    }
}
