//! Embedding provider implementations.
//!
//! The remote provider calls an HTTP embedding API and fails fast when
//! credentials are missing. The hashing provider is fully deterministic
//! and offline, which keeps the whole pipeline runnable in tests and on
//! air-gapped machines.

pub mod hashing;
pub mod remote;

use std::sync::Arc;
use tracing::info;

use carekb_core::config::{EmbeddingBackend, EmbeddingConfig};
use carekb_core::traits::EmbeddingProvider;

pub use hashing::HashingProvider;
pub use remote::RemoteProvider;

/// Build the configured embedding provider.
///
/// `CAREKB_USE_HASH_EMBEDDINGS=1` forces the hashing provider regardless
/// of configuration, mirroring how tests and offline runs opt out of the
/// remote API.
pub fn get_default_provider(cfg: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let force_hash = std::env::var("CAREKB_USE_HASH_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if force_hash || cfg.backend == EmbeddingBackend::Hash {
        info!(dim = cfg.dim, "using deterministic hashing embedder");
        return Ok(Arc::new(HashingProvider::new(cfg.dim)));
    }
    Ok(Arc::new(RemoteProvider::new(cfg)?))
}
