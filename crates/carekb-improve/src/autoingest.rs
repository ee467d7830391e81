//! Promotion of discovered resources into corpus documents.
//!
//! Only high-relevance resources qualify. The created document carries
//! a templated placeholder body referencing the source URL rather than
//! fetched full text; retrieval quality for these stubs is limited
//! until the real content is pulled in.
//! TODO: fetch and sanitize the full resource body instead of the stub.

use tracing::{info, warn};

use carekb_core::traits::DocumentStore as _;
use carekb_core::types::{DiscoveredResource, NewDocument};

use crate::ImprovementEngine;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "onto", "of", "in", "on", "to", "a", "an",
];

const MAX_TAGS: usize = 6;

/// Lowercased title words, stop words removed, punctuation stripped.
fn tags_from_title(title: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for word in title.split_whitespace() {
        let tag: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if tag.len() < 3 || STOP_WORDS.contains(&tag.as_str()) || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

fn stub_document(resource: &DiscoveredResource) -> NewDocument {
    NewDocument {
        title: resource.title.clone(),
        doc_type: resource.doc_type,
        source: resource.source_class.as_str().to_string(),
        url: Some(resource.url.clone()),
        content: format!(
            "Externally discovered reference: {}. The full text of this {} is available at {}. \
             This entry was created automatically from discovery query \"{}\" and records the \
             resource for retrieval until its complete content is fetched and reviewed.",
            resource.title,
            resource.doc_type.as_str(),
            resource.url,
            resource.query
        ),
        version: "auto-1".into(),
        tags: tags_from_title(&resource.title),
    }
}

impl ImprovementEngine {
    /// Create and index documents for every auto-ingestible resource.
    /// Failures are logged per resource and never abort the batch.
    /// Returns how many resources ended up indexed.
    pub(crate) async fn auto_ingest(&self, resources: &[DiscoveredResource]) -> usize {
        let mut ingested = 0;
        for resource in resources.iter().filter(|r| r.auto_ingestible) {
            match self.docs().create(stub_document(resource)).await {
                Ok(doc) => {
                    if self.retrieval().ingest_document(&doc.id).await {
                        info!(document_id = %doc.id, url = %resource.url, "auto-ingested resource");
                        ingested += 1;
                    } else {
                        warn!(document_id = %doc.id, url = %resource.url, "auto-ingestion indexing failed");
                    }
                }
                Err(err) => {
                    warn!(url = %resource.url, error = %err, "auto-ingestion create failed");
                }
            }
        }
        ingested
    }
}
