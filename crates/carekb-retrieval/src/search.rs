//! Cache-wrapped similarity search and context assembly.
//!
//! Search errors are swallowed at this boundary: triage flows must treat
//! "no evidence found" and "search failed" identically, so every public
//! entry point degrades to an empty result set instead of erroring.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::warn;

use carekb_core::traits::{DocumentStore as _, EmbeddingProvider as _, VectorStore as _};
use carekb_core::types::{Context, Document, DocumentType, SearchOptions, SearchResult};

use crate::RetrievalService;

#[derive(Serialize)]
struct SearchParams<'a> {
    query: &'a str,
    options: &'a SearchOptions,
}

impl RetrievalService {
    /// Ranked, enriched search results for a free-text query. Never
    /// fails; backend errors surface as an empty result set.
    pub async fn search_documents(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let params = SearchParams { query, options };
        let fetched = self
            .cache()
            .get_or_set(carekb_cache::SEARCH, "documents", &params, None, || {
                self.search_uncached(query, options)
            })
            .await;
        match fetched {
            Ok(results) => results,
            Err(err) => {
                warn!(query, error = %err, "search failed, returning empty result set");
                Vec::new()
            }
        }
    }

    async fn search_uncached(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let embedding = self.embedder().embed(query).await?;
        // Over-fetch when a type filter may drop hits afterwards.
        let fetch_limit = if options.document_types.is_some() {
            options.limit * 4
        } else {
            options.limit
        };
        let hits = self
            .vectors()
            .search(&embedding, options.threshold, fetch_limit)
            .await?;
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        // One batched enrichment fetch for the distinct parent ids; a
        // per-hit lookup here was the original sin this replaces.
        let mut ids: Vec<String> = Vec::new();
        for hit in &hits {
            if !ids.contains(&hit.document_id) {
                ids.push(hit.document_id.clone());
            }
        }
        let documents = self.docs().get_by_ids(&ids).await?;
        let by_id: HashMap<&str, &Document> =
            documents.iter().map(|d| (d.id.as_str(), d)).collect();

        let mut results = Vec::with_capacity(hits.len());
        for hit in &hits {
            let Some(doc) = by_id.get(hit.document_id.as_str()) else {
                continue;
            };
            if !doc.active {
                continue;
            }
            if let Some(types) = &options.document_types {
                if !types.contains(&doc.doc_type) {
                    continue;
                }
            }
            results.push(SearchResult {
                content: hit.content.clone(),
                similarity: hit.similarity,
                document_id: doc.id.clone(),
                title: doc.title.clone(),
                doc_type: doc.doc_type,
                source: doc.source.clone(),
            });
        }
        results.truncate(options.limit);
        Ok(results)
    }

    /// Assemble a retrieval context: ranked results plus a human-readable
    /// summary. An empty context is a valid outcome, never an error.
    pub async fn get_context(&self, query: &str, options: &SearchOptions) -> Context {
        let started = Instant::now();
        let params = SearchParams { query, options };
        let fetched = self
            .cache()
            .get_or_set(carekb_cache::SESSION, "context", &params, None, || async {
                let results = self.search_documents(query, options).await;
                let summary = build_summary(query, &results);
                Ok(Context {
                    query: query.to_string(),
                    total_results: results.len(),
                    results,
                    summary,
                    took: started.elapsed(),
                })
            })
            .await;
        match fetched {
            Ok(context) => context,
            Err(err) => {
                warn!(query, error = %err, "context assembly failed, returning empty context");
                Context {
                    query: query.to_string(),
                    results: Vec::new(),
                    summary: build_summary(query, &[]),
                    total_results: 0,
                    took: started.elapsed(),
                }
            }
        }
    }

    /// General triage retrieval: protocols and guidelines at the
    /// standard threshold.
    pub async fn triage_context(&self, text: &str) -> Context {
        let policy = self.config().triage;
        self.get_context(
            text,
            &SearchOptions {
                limit: policy.limit,
                threshold: policy.threshold,
                document_types: Some(vec![DocumentType::Protocol, DocumentType::Guideline]),
            },
        )
        .await
    }

    /// Emergency retrieval: protocols only, stricter threshold. Trades
    /// recall for precision; a weak match is worse than no match here.
    pub async fn emergency_context(&self, text: &str) -> Context {
        let policy = self.config().emergency;
        self.get_context(
            text,
            &SearchOptions {
                limit: policy.limit,
                threshold: policy.threshold,
                document_types: Some(vec![DocumentType::Protocol]),
            },
        )
        .await
    }

    pub async fn mental_health_context(&self, text: &str) -> Context {
        let policy = self.config().mental_health;
        self.get_context(
            text,
            &SearchOptions {
                limit: policy.limit,
                threshold: policy.threshold,
                document_types: Some(vec![DocumentType::Protocol, DocumentType::Guideline]),
            },
        )
        .await
    }
}

fn build_summary(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No relevant passages found for \"{}\".", query.trim());
    }
    let types: BTreeSet<&str> = results.iter().map(|r| r.doc_type.as_str()).collect();
    let sources: BTreeSet<&str> = results.iter().map(|r| r.source.as_str()).collect();
    let mean =
        results.iter().map(|r| r.similarity).sum::<f32>() / results.len() as f32;
    format!(
        "{} passages from {} document type(s) ({}) across {} source(s); mean similarity {:.0}%.",
        results.len(),
        types.len(),
        types.into_iter().collect::<Vec<_>>().join(", "),
        sources.len(),
        mean * 100.0
    )
}
