use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use carekb_core::traits::DocumentStore;
use carekb_core::types::{Document, DocumentType, NewDocument};
use carekb_core::Error;

/// In-memory `DocumentStore`. Documents are deactivated, never removed.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<String, Document>>,
    next_id: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document under a caller-chosen id; test fixtures use this
    /// to get stable ids.
    pub async fn insert_with_id(&self, id: &str, new: NewDocument) -> Document {
        let now = Utc::now();
        let doc = Document {
            id: id.to_string(),
            title: new.title,
            doc_type: new.doc_type,
            source: new.source,
            url: new.url,
            content: new.content,
            version: new.version,
            tags: new.tags,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.docs.write().await.insert(id.to_string(), doc.clone());
        doc
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, new: NewDocument) -> anyhow::Result<Document> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("doc-{}", n + 1);
        Ok(self.insert_with_id(&id, new).await)
    }

    async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn get_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(ids.iter().filter_map(|id| docs.get(id).cloned()).collect())
    }

    async fn get_by_type(&self, doc_type: DocumentType) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.active && d.doc_type == doc_type)
            .cloned()
            .collect())
    }

    async fn get_by_tags(&self, tags: &[String]) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.active && d.tags.iter().any(|t| tags.contains(t)))
            .cloned()
            .collect())
    }

    async fn search_content(&self, needle: &str) -> anyhow::Result<Vec<Document>> {
        let needle = needle.to_lowercase();
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.active && d.content.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Document>> {
        let docs = self.docs.read().await;
        Ok(docs.values().filter(|d| d.active).cloned().collect())
    }

    async fn deactivate(&self, id: &str) -> anyhow::Result<()> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("document {}", id)))?;
        doc.active = false;
        doc.updated_at = Utc::now();
        Ok(())
    }
}
