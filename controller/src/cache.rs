//! Pipeline instance caching.
//!
//! Loading a model is the expensive part of a request. By default every
//! request loads its own instance; with [`CachePolicy::Lru`] loaded instances
//! are kept by model name and shared behind a mutex, so requests for the same
//! model run one at a time on the cached instance.

use cadenza_pipeline::Pipeline;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A loaded pipeline shared between requests.
pub type SharedPipeline = Arc<Mutex<Box<dyn Pipeline>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Load a fresh instance for every request.
    #[default]
    PerRequest,
    /// Keep up to `capacity` loaded instances, evicting the least recently used.
    Lru { capacity: usize },
}

impl CachePolicy {
    /// `0` means no caching.
    pub fn from_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            Self::PerRequest
        } else {
            Self::Lru { capacity }
        }
    }
}

/// A simple LRU (Least Recently Used) cache.
pub struct LruCache<K, V> {
    /// The maximum number of entries the cache can hold
    capacity: usize,

    entries: HashMap<K, V>,

    /// Most recently used at the front
    order: VecDeque<K>,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Look up `key` and mark it most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = self.entries.get(key).cloned()?;
        self.order.retain(|k| k != key);
        self.order.push_front(key.clone());
        Some(value)
    }

    /// Insert or replace `key`. Returns the evicted entry, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        let mut evicted = None;
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        } else if self.entries.len() >= self.capacity {
            if let Some(lru_key) = self.order.pop_back() {
                evicted = self.entries.remove(&lru_key).map(|v| (lru_key, v));
            }
        }

        self.entries.insert(key.clone(), value);
        self.order.push_front(key);
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.order.retain(|k| k != key);
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Hit/miss counters.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
}

impl CacheStats {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Policy-driven store of loaded pipelines, keyed by model name.
pub struct PipelineCache {
    policy: CachePolicy,
    lru: Option<Mutex<LruCache<String, SharedPipeline>>>,
    stats: CacheStats,
}

impl PipelineCache {
    pub fn new(policy: CachePolicy) -> Self {
        let lru = match policy {
            CachePolicy::PerRequest => None,
            CachePolicy::Lru { capacity } => Some(Mutex::new(LruCache::new(capacity.max(1)))),
        };
        Self {
            policy,
            lru,
            stats: CacheStats::default(),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Cached instance for `model`. Always `None` under `PerRequest`.
    pub fn get(&self, model: &str) -> Option<SharedPipeline> {
        let lru = self.lru.as_ref()?;
        let hit = lru.lock().get(&model.to_string());
        match hit {
            Some(_) => self.stats.hits.fetch_add(1, Ordering::Relaxed),
            None => self.stats.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Keep `pipeline` for later requests. A concurrent miss may insert twice;
    /// the last insert wins.
    pub fn insert(&self, model: &str, pipeline: SharedPipeline) {
        if let Some(lru) = &self.lru {
            if let Some((evicted, _)) = lru.lock().put(model.to_string(), pipeline) {
                tracing::debug!(model = %evicted, "Evicted cached pipeline");
            }
        }
    }

    /// Drop a cached instance, e.g. after it failed mid-run.
    pub fn invalidate(&self, model: &str) {
        if let Some(lru) = &self.lru {
            lru.lock().remove(&model.to_string());
        }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.lru
            .as_ref()
            .map(|lru| lru.lock().contains(&model.to_string()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lru.as_ref().map(|lru| lru.lock().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
