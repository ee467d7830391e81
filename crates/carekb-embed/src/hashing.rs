//! Deterministic hashing embedder.
//!
//! Each whitespace token is hashed into one of `dim` buckets and the
//! resulting vector is L2-normalized. Texts sharing vocabulary land close
//! together, which is enough signal for offline runs and tests; it is not
//! a substitute for a real embedding model.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use carekb_core::traits::EmbeddingProvider;

pub struct HashingProvider {
    dim: usize,
}

impl HashingProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.to_lowercase().split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_sync(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let provider = HashingProvider::new(64);
        let a = provider.embed("chest pain with shortness of breath").await.unwrap();
        let b = provider.embed("chest pain with shortness of breath").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let provider = HashingProvider::new(32);
        let texts = vec!["alpha".to_string(), "bravo".to_string(), "charlie".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(vector, &provider.embed(text).await.unwrap());
        }
    }

    #[tokio::test]
    async fn vectors_are_normalized() {
        let provider = HashingProvider::new(128);
        let v = provider.embed("oxygen saturation below ninety percent").await.unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_disjoint() {
        use carekb_core::similarity::cosine_similarity;
        let provider = HashingProvider::new(256);
        let q = provider.embed("chest pain emergency").await.unwrap();
        let near = provider.embed("emergency protocol for chest pain").await.unwrap();
        let far = provider.embed("quarterly budget reconciliation meeting").await.unwrap();
        assert!(cosine_similarity(&q, &near) > cosine_similarity(&q, &far));
    }
}
