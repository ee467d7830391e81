//! External resource discovery and quality scoring.
//!
//! Candidates come back from a `WebDiscoveryProvider`; this module
//! filters them by relevance and source authority, scores a quality
//! tier, deduplicates by URL and ranks the survivors.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use carekb_core::traits::WebDiscoveryProvider;
use carekb_core::types::{
    DiscoveredResource, DocumentType, QualityTier, SourceClass, WebCandidate,
};
use carekb_core::Error;

use crate::patterns::QueryCategory;
use crate::ImprovementEngine;

/// Fan-out bound: at most this many discovery queries per analysis.
const MAX_QUERIES: usize = 3;
/// At most this many kept candidates per query.
const PER_QUERY_CAP: usize = 2;
/// Candidates at or below this relevance are noise.
const RELEVANCE_FLOOR: f32 = 0.7;
/// Only resources above this relevance may be auto-ingested.
const AUTO_INGEST_FLOOR: f32 = 0.8;

/// Targeted discovery queries from the query category and the extracted
/// keywords. Empty keyword sets produce no queries; there is nothing
/// specific enough to search for.
pub(crate) fn build_queries(category: QueryCategory, keywords: &[String]) -> Vec<String> {
    let suffix = match category {
        QueryCategory::Emergency => "emergency protocol",
        QueryCategory::Specialist => "specialist referral protocol",
        QueryCategory::MentalHealth => "mental health guideline",
        QueryCategory::Routine | QueryCategory::General => "clinical guideline",
    };
    let mut queries: Vec<String> = keywords
        .iter()
        .take(2)
        .map(|kw| format!("{} {}", kw, suffix))
        .collect();
    if keywords.len() >= 2 {
        queries.push(format!("{} {} {}", keywords[0], keywords[1], suffix));
    }
    queries.truncate(MAX_QUERIES);
    queries.dedup();
    queries
}

fn source_weight(class: SourceClass) -> f32 {
    match class {
        SourceClass::Official => 0.4,
        SourceClass::Government => 0.35,
        SourceClass::MedicalAuthority => 0.3,
        SourceClass::Other => 0.1,
    }
}

fn doc_type_weight(doc_type: DocumentType) -> f32 {
    match doc_type {
        DocumentType::Protocol | DocumentType::Guideline => 0.3,
        _ => 0.1,
    }
}

fn relevance_weight(relevance: f32) -> f32 {
    if relevance > 0.9 {
        0.3
    } else if relevance > 0.8 {
        0.2
    } else {
        0.1
    }
}

/// Weighted quality tier: source authority, document-type authority and
/// relevance band.
pub(crate) fn quality_tier(candidate: &WebCandidate) -> QualityTier {
    let score = source_weight(candidate.source_class)
        + doc_type_weight(candidate.doc_type)
        + relevance_weight(candidate.relevance);
    if score >= 0.8 {
        QualityTier::High
    } else if score >= 0.55 {
        QualityTier::Medium
    } else {
        QualityTier::Low
    }
}

impl ImprovementEngine {
    /// Run every discovery query, filter and score the candidates.
    /// Provider failures are per-query; one dead query never empties
    /// the whole batch.
    pub(crate) async fn discover(&self, queries: &[String]) -> Vec<DiscoveredResource> {
        let mut seen_urls: HashSet<String> = HashSet::new();
        let mut resources: Vec<DiscoveredResource> = Vec::new();
        for query in queries {
            let candidates = match self.provider().search(query).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(query, error = %err, "discovery query failed");
                    continue;
                }
            };
            let kept = candidates
                .into_iter()
                .filter(|c| c.relevance > RELEVANCE_FLOOR && c.source_class != SourceClass::Other)
                .take(PER_QUERY_CAP);
            for candidate in kept {
                if !seen_urls.insert(candidate.url.clone()) {
                    continue;
                }
                resources.push(DiscoveredResource {
                    quality: quality_tier(&candidate),
                    auto_ingestible: candidate.relevance > AUTO_INGEST_FLOOR,
                    title: candidate.title,
                    url: candidate.url,
                    source_class: candidate.source_class,
                    doc_type: candidate.doc_type,
                    relevance: candidate.relevance,
                    query: query.clone(),
                });
            }
        }
        resources.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(queries = queries.len(), kept = resources.len(), "discovery finished");
        resources
    }
}

/// Discovery over an HTTP search API returning candidate documents as
/// JSON. Construction validates the endpoint so a misconfigured
/// deployment fails at startup.
pub struct HttpDiscoveryProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct DiscoveryResponse {
    results: Vec<WebCandidate>,
}

impl HttpDiscoveryProvider {
    pub fn new(endpoint: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig("discovery endpoint is not set".into()).into());
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl WebDiscoveryProvider for HttpDiscoveryProvider {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<WebCandidate>> {
        let mut request = self.client.get(&self.endpoint).query(&[("q", query)]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::Discovery(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(
                Error::Discovery(format!("provider returned status {}", response.status()))
                    .into(),
            );
        }
        let body: DiscoveryResponse = response
            .json()
            .await
            .map_err(|e| Error::Discovery(format!("malformed response: {}", e)))?;
        Ok(body.results)
    }
}

/// Canned discovery provider; returns the same candidate list for every
/// query. Intended for tests and offline runs.
#[derive(Default)]
pub struct StaticDiscoveryProvider {
    candidates: Vec<WebCandidate>,
}

impl StaticDiscoveryProvider {
    pub fn new(candidates: Vec<WebCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl WebDiscoveryProvider for StaticDiscoveryProvider {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<WebCandidate>> {
        Ok(self.candidates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(relevance: f32, source: SourceClass, doc_type: DocumentType) -> WebCandidate {
        WebCandidate {
            title: "Acute Chest Pain Pathway".into(),
            url: "https://example.org/chest-pain".into(),
            content: String::new(),
            relevance,
            source_class: source,
            doc_type,
        }
    }

    #[test]
    fn official_protocol_with_high_relevance_scores_high() {
        let tier = quality_tier(&candidate(0.95, SourceClass::Official, DocumentType::Protocol));
        assert_eq!(tier, QualityTier::High);
    }

    #[test]
    fn government_policy_at_modest_relevance_scores_medium() {
        let tier = quality_tier(&candidate(0.75, SourceClass::Government, DocumentType::Policy));
        assert_eq!(tier, QualityTier::Medium);
    }

    #[test]
    fn weak_source_and_type_score_low() {
        let tier = quality_tier(&candidate(0.72, SourceClass::Other, DocumentType::Standard));
        assert_eq!(tier, QualityTier::Low);
    }

    #[test]
    fn queries_are_capped_at_three() {
        let keywords = vec![
            "chest pain".to_string(),
            "shortness of breath".to_string(),
            "dizziness".to_string(),
        ];
        let queries = build_queries(QueryCategory::Emergency, &keywords);
        assert_eq!(queries.len(), 3);
        assert!(queries[0].contains("chest pain"));
        assert!(queries.iter().all(|q| q.contains("emergency protocol")));
    }

    #[test]
    fn no_keywords_means_no_queries() {
        assert!(build_queries(QueryCategory::General, &[]).is_empty());
    }

    #[test]
    fn empty_endpoint_fails_at_construction() {
        assert!(HttpDiscoveryProvider::new("", None).is_err());
    }
}
