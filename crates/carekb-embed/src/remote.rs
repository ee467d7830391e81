//! Remote HTTP embedding provider.
//!
//! Speaks the common `POST /embeddings {model, input: [...]}` shape.
//! Construction validates credentials up front so a missing key fails at
//! startup, not on the first query.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use carekb_core::config::EmbeddingConfig;
use carekb_core::traits::EmbeddingProvider;
use carekb_core::Error;

#[derive(Debug)]
pub struct RemoteProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl RemoteProvider {
    pub fn new(cfg: &EmbeddingConfig) -> anyhow::Result<Self> {
        let endpoint = cfg
            .endpoint
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidConfig("embedding.endpoint is not set".into()))?;
        let api_key = cfg
            .api_key
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidConfig("embedding.api_key is not set".into()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model: cfg.model.clone().unwrap_or_else(|| "text-embedding-3-small".into()),
            dim: cfg.dim,
        })
    }

    async fn request(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::Embedding(format!(
                "provider returned status {}",
                response.status()
            ))
            .into());
        }
        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed response: {}", e)))?;
        if body.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "provider returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            ))
            .into());
        }
        let mut vectors = Vec::with_capacity(body.data.len());
        for row in body.data {
            if row.embedding.len() != self.dim {
                return Err(Error::DimensionMismatch {
                    expected: self.dim,
                    got: row.embedding.len(),
                }
                .into());
            }
            vectors.push(row.embedding);
        }
        debug!(count = vectors.len(), "embedded batch via remote provider");
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteProvider {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_fails_at_construction() {
        let cfg = EmbeddingConfig {
            backend: carekb_core::config::EmbeddingBackend::Remote,
            dim: 384,
            endpoint: Some("https://api.example.com/v1/embeddings".into()),
            api_key: None,
            model: None,
        };
        let err = RemoteProvider::new(&cfg).expect_err("must fail fast");
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn missing_endpoint_fails_at_construction() {
        let cfg = EmbeddingConfig {
            backend: carekb_core::config::EmbeddingBackend::Remote,
            dim: 384,
            endpoint: None,
            api_key: Some("sk-test".into()),
            model: None,
        };
        assert!(RemoteProvider::new(&cfg).is_err());
    }
}
