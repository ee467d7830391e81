//! In-process TTL/LRU cache with named partitions and hit/miss accounting.
//!
//! The cache is consulted before any expensive fetch and written through
//! on misses. Expired entries are logical misses but stay resident until
//! evicted, which is what makes stale fallback possible: when a fetcher
//! fails and a stale entry exists, the stale value is served instead of
//! the error. This is also why the map is hand-built rather than backed
//! by a TTL-evicting cache crate.
//!
//! Single-instance by design; multi-instance deployments need a
//! distributed backend behind the same surface.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use carekb_core::config::CacheConfig;
use carekb_core::Error;

/// Partition for search result sets.
pub const SEARCH: &str = "search";
/// Partition for document-store round-trips.
pub const STORE: &str = "store";
/// Partition for assembled contexts.
pub const SESSION: &str = "session";
/// Partition for everything else (index status, counters).
pub const GENERAL: &str = "general";

const PARTITIONS: [&str; 4] = [SEARCH, STORE, SESSION, GENERAL];

struct Entry {
    value: serde_json::Value,
    created: Instant,
    ttl: Duration,
    last_used: u64,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.created.elapsed() < self.ttl
    }
}

struct Partition {
    capacity: usize,
    default_ttl: Duration,
    map: HashMap<String, Entry>,
    hits: u64,
    misses: u64,
    tick: u64,
}

impl Partition {
    fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            default_ttl,
            map: HashMap::new(),
            hits: 0,
            misses: 0,
            tick: 0,
        }
    }

    fn touch(&mut self, key: &str) {
        self.tick += 1;
        let tick = self.tick;
        if let Some(entry) = self.map.get_mut(key) {
            entry.last_used = tick;
        }
    }

    fn insert(&mut self, key: String, value: serde_json::Value, ttl: Duration) {
        while self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            let evict = self
                .map
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match evict {
                Some(k) => {
                    self.map.remove(&k);
                }
                None => break,
            }
        }
        self.tick += 1;
        self.map.insert(
            key,
            Entry { value, created: Instant::now(), ttl, last_used: self.tick },
        );
    }
}

/// Hit/miss counters for one partition.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub partitions: Vec<PartitionStats>,
}

impl CacheStats {
    pub fn average_hit_rate(&self) -> f64 {
        if self.partitions.is_empty() {
            return 0.0;
        }
        self.partitions.iter().map(|p| p.hit_rate).sum::<f64>() / self.partitions.len() as f64
    }
}

pub struct CacheLayer {
    partitions: HashMap<&'static str, Mutex<Partition>>,
    health_min_hit_rate: f64,
}

impl CacheLayer {
    pub fn new(cfg: &CacheConfig) -> Self {
        let mut partitions = HashMap::new();
        for (name, part) in [
            (SEARCH, &cfg.search),
            (STORE, &cfg.store),
            (SESSION, &cfg.session),
            (GENERAL, &cfg.general),
        ] {
            partitions.insert(
                name,
                Mutex::new(Partition::new(part.capacity, Duration::from_secs(part.ttl_secs))),
            );
        }
        Self { partitions, health_min_hit_rate: cfg.health_min_hit_rate }
    }

    /// Composite key: `partition:base_key[:hash(params)]`.
    ///
    /// Params are serialized through `serde_json`, whose map keys are
    /// sorted, so logically equal params always hash identically.
    pub fn composite_key<P: Serialize>(
        partition: &str,
        base_key: &str,
        params: &P,
    ) -> anyhow::Result<String> {
        let value = serde_json::to_value(params)?;
        if value.is_null() {
            return Ok(format!("{}:{}", partition, base_key));
        }
        let hash = blake3::hash(serde_json::to_string(&value)?.as_bytes());
        Ok(format!("{}:{}:{}", partition, base_key, &hash.to_hex()[..16]))
    }

    /// Fetch-through read. A live entry is a hit; otherwise the fetcher
    /// runs and its result is stored under `ttl` (or the partition
    /// default). If the fetcher fails and a stale entry is resident, the
    /// stale value is returned instead of the error.
    pub async fn get_or_set<T, P, F, Fut>(
        &self,
        partition: &str,
        base_key: &str,
        params: &P,
        ttl: Option<Duration>,
        fetch: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = Self::composite_key(partition, base_key, params)?;
        let part = self.partition(partition)?;

        // Lock scope kept synchronous; never held across an await.
        let stale = {
            let mut guard = lock(part);
            let resident = guard
                .map
                .get(&key)
                .map(|entry| (entry.value.clone(), entry.is_live()));
            match resident {
                Some((value, true)) => {
                    guard.hits += 1;
                    guard.touch(&key);
                    return Ok(serde_json::from_value(value)?);
                }
                Some((value, false)) => {
                    guard.misses += 1;
                    Some(value)
                }
                None => {
                    guard.misses += 1;
                    None
                }
            }
        };

        match fetch().await {
            Ok(value) => {
                let serialized = serde_json::to_value(&value)?;
                let mut guard = lock(part);
                let ttl = ttl.unwrap_or(guard.default_ttl);
                guard.insert(key, serialized, ttl);
                Ok(value)
            }
            Err(err) => match stale {
                Some(value) => {
                    warn!(key = %key, error = %err, "fetch failed, serving stale cache entry");
                    Ok(serde_json::from_value(value)?)
                }
                None => Err(err),
            },
        }
    }

    /// Direct read, bypassing fetch-on-miss. Expired entries read as
    /// `None` and count as misses.
    pub fn get<T: DeserializeOwned>(&self, partition: &str, base_key: &str) -> Option<T> {
        let key = format!("{}:{}", partition, base_key);
        let part = self.partition(partition).ok()?;
        let mut guard = lock(part);
        let live = guard
            .map
            .get(&key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone());
        match live {
            Some(value) => {
                guard.hits += 1;
                guard.touch(&key);
                serde_json::from_value(value).ok()
            }
            None => {
                guard.misses += 1;
                None
            }
        }
    }

    /// Direct write with the given (or partition-default) TTL.
    pub fn set<T: Serialize>(
        &self,
        partition: &str,
        base_key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> anyhow::Result<()> {
        let key = format!("{}:{}", partition, base_key);
        let part = self.partition(partition)?;
        let serialized = serde_json::to_value(value)?;
        let mut guard = lock(part);
        let ttl = ttl.unwrap_or(guard.default_ttl);
        guard.insert(key, serialized, ttl);
        Ok(())
    }

    /// Remove every key in `partition` containing `substring`; returns
    /// how many entries were dropped. Used for targeted invalidation
    /// after a document mutation.
    pub fn invalidate(&self, partition: &str, substring: &str) -> usize {
        let Ok(part) = self.partition(partition) else {
            return 0;
        };
        let mut guard = lock(part);
        let before = guard.map.len();
        guard.map.retain(|k, _| !k.contains(substring));
        before - guard.map.len()
    }

    /// Substring invalidation across every partition.
    pub fn invalidate_everywhere(&self, substring: &str) -> usize {
        PARTITIONS
            .iter()
            .map(|p| self.invalidate(p, substring))
            .sum()
    }

    pub fn invalidate_all(&self) {
        for part in self.partitions.values() {
            lock(part).map.clear();
        }
        debug!("all cache partitions cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let mut partitions = Vec::with_capacity(PARTITIONS.len());
        for name in PARTITIONS {
            if let Some(part) = self.partitions.get(name) {
                let guard = lock(part);
                let total = guard.hits + guard.misses;
                partitions.push(PartitionStats {
                    name: name.to_string(),
                    hits: guard.hits,
                    misses: guard.misses,
                    size: guard.map.len(),
                    hit_rate: if total == 0 {
                        0.0
                    } else {
                        guard.hits as f64 / total as f64
                    },
                });
            }
        }
        CacheStats { partitions }
    }

    /// Heuristic health signal: average hit rate above the configured
    /// floor. Not a correctness invariant.
    pub fn is_healthy(&self) -> bool {
        self.stats().average_hit_rate() > self.health_min_hit_rate
    }

    fn partition(&self, name: &str) -> anyhow::Result<&Mutex<Partition>> {
        self.partitions
            .get(name)
            .ok_or_else(|| Error::Operation(format!("unknown cache partition: {}", name)).into())
    }
}

impl Default for CacheLayer {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn lock(part: &Mutex<Partition>) -> std::sync::MutexGuard<'_, Partition> {
    // Entries are plain data; a poisoned lock only means a panic while
    // holding it, so the map is still usable.
    match part.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
