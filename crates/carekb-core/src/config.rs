//! Configuration loader and typed engine settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `CAREKB_*`
//! env vars into an [`EngineConfig`], validated once at startup. Missing
//! provider credentials fail here, not on first use.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::Error;

/// Which embedding provider to construct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Remote HTTP embedding API; requires `endpoint` and `api_key`.
    Remote,
    /// Deterministic hashing embedder for offline and test use.
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Embedding dimensionality (D), constant across the corpus.
    pub dim: usize,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Hash,
            dim: 384,
            endpoint: None,
            api_key: None,
            model: None,
        }
    }
}

/// Threshold/limit pair for one retrieval policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub threshold: f32,
    pub limit: usize,
}

/// Per-use-case retrieval parameters. The emergency threshold is
/// deliberately stricter: it trades recall for precision because a false
/// negative there costs more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub triage: PolicyConfig,
    pub emergency: PolicyConfig,
    pub mental_health: PolicyConfig,
    /// Looser threshold used when probing for knowledge gaps.
    pub gap_threshold: f32,
    pub gap_limit: usize,
    /// TTL for the cached index status snapshot, in seconds.
    pub status_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            triage: PolicyConfig { threshold: 0.75, limit: 3 },
            emergency: PolicyConfig { threshold: 0.80, limit: 3 },
            mental_health: PolicyConfig { threshold: 0.75, limit: 3 },
            gap_threshold: 0.7,
            gap_limit: 5,
            status_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePartitionConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub search: CachePartitionConfig,
    pub store: CachePartitionConfig,
    pub session: CachePartitionConfig,
    pub general: CachePartitionConfig,
    /// Average hit rate below which the cache reports unhealthy. A
    /// heuristic, never enforced.
    pub health_min_hit_rate: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search: CachePartitionConfig { capacity: 500, ttl_secs: 300 },
            store: CachePartitionConfig { capacity: 1000, ttl_secs: 600 },
            session: CachePartitionConfig { capacity: 200, ttl_secs: 180 },
            general: CachePartitionConfig { capacity: 500, ttl_secs: 300 },
            health_min_hit_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Load configuration for the current `RUST_ENV` profile and
    /// validate it. `CAREKB_*` env vars override file values, e.g.
    /// `CAREKB_EMBEDDING.API_KEY`.
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("CAREKB_").split("."));

        let config: EngineConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be > 0".into()));
        }
        if self.embedding.backend == EmbeddingBackend::Remote {
            if self.embedding.endpoint.as_deref().unwrap_or("").is_empty() {
                return Err(Error::InvalidConfig(
                    "embedding.endpoint is required for the remote backend".into(),
                ));
            }
            if self.embedding.api_key.as_deref().unwrap_or("").is_empty() {
                return Err(Error::InvalidConfig(
                    "embedding.api_key is required for the remote backend".into(),
                ));
            }
        }
        for (name, policy) in [
            ("triage", self.retrieval.triage),
            ("emergency", self.retrieval.emergency),
            ("mental_health", self.retrieval.mental_health),
        ] {
            if !(0.0..=1.0).contains(&policy.threshold) {
                return Err(Error::InvalidConfig(format!(
                    "retrieval.{}.threshold must be within [0, 1]",
                    name
                )));
            }
            if policy.limit == 0 {
                return Err(Error::InvalidConfig(format!(
                    "retrieval.{}.limit must be > 0",
                    name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.retrieval.gap_threshold) {
            return Err(Error::InvalidConfig(
                "retrieval.gap_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.cache.health_min_hit_rate) {
            return Err(Error::InvalidConfig(
                "cache.health_min_hit_rate must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}
