//! Advisory learning recommendations. Free-text output from simple rule
//! matches; nothing here is actioned automatically.

use carekb_core::types::KnowledgeGap;

use crate::patterns::{self, QueryCategory};

/// Below this many active documents the corpus is considered thin.
const SMALL_CORPUS: usize = 10;
/// At this many gaps a one-off fix stops scaling.
const MANY_GAPS: usize = 3;

pub(crate) fn recommendations(
    query: &str,
    category: QueryCategory,
    gaps: &[KnowledgeGap],
    corpus_size: Option<usize>,
) -> Vec<String> {
    let mut out = Vec::new();
    if gaps.len() >= MANY_GAPS {
        out.push(format!(
            "{} knowledge gaps detected for one query; set up a scheduled ingestion pipeline \
             instead of closing gaps one at a time.",
            gaps.len()
        ));
    }
    if patterns::has_emergency_language(query)
        && matches!(category, QueryCategory::Routine | QueryCategory::General)
    {
        out.push(format!(
            "Query \"{}\" uses emergency language but was classified as {}; review the upstream \
             triage classification for possible under-triage.",
            query,
            category.as_str()
        ));
    }
    if let Some(size) = corpus_size {
        if size < SMALL_CORPUS {
            out.push(format!(
                "Corpus holds only {} active document(s); expand the index before relying on \
                 retrieval coverage.",
                size
            ));
        }
    }
    out
}
