//! Tracked caches with registry-wide, strategy-driven eviction.
//!
//! Caches have no capacity bound of their own: they grow freely until a
//! mutation site calls [`CacheRegistry::check_and_clear`] with its signal
//! above the threshold, at which point one eviction pass runs over every
//! registered cache. Coarse, checkpoint-driven control rather than a
//! classical bounded LRU.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use crate::observability;

/// How an eviction pass chooses its victims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// Clear every entry regardless of percentage.
    All,
    /// Oldest last-access time first.
    Lru,
    /// Lowest access count first.
    Lfu,
    /// Oldest creation time first.
    TimeBased,
}

/// Per-entry usage metadata.
#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    created_at: Instant,
    last_access: Instant,
    access_count: u64,
}

impl EntryMeta {
    fn new(now: Instant) -> Self {
        Self {
            created_at: now,
            last_access: now,
            access_count: 1,
        }
    }
}

struct CacheState<K, V> {
    name: &'static str,
    entries: DashMap<K, V>,
    meta: DashMap<K, EntryMeta>,
}

impl<K: Eq + Hash + Clone, V> CacheState<K, V> {
    fn record_access(&self, key: &K) {
        let now = Instant::now();
        self.meta
            .entry(key.clone())
            .and_modify(|m| {
                m.last_access = now;
                m.access_count += 1;
            })
            .or_insert_with(|| EntryMeta::new(now));
    }
}

/// Erased view of a cache so the registry can evict without knowing key or
/// value types. Victim selection happens behind this trait, where the key
/// type is still concrete.
trait EvictableCache: Send + Sync {
    fn evict(&self, strategy: EvictionStrategy, percentage: u32) -> usize;
}

impl<K, V> EvictableCache for CacheState<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Send + Sync,
{
    fn evict(&self, strategy: EvictionStrategy, percentage: u32) -> usize {
        let len = self.entries.len();
        if len == 0 {
            return 0;
        }
        if strategy == EvictionStrategy::All {
            self.entries.clear();
            self.meta.clear();
            return len;
        }

        let remove_count = (len * percentage as usize).div_ceil(100).max(1);

        let mut candidates: Vec<(K, EntryMeta)> = self
            .meta
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        match strategy {
            EvictionStrategy::Lru => candidates.sort_by_key(|(_, m)| m.last_access),
            EvictionStrategy::Lfu => candidates.sort_by_key(|(_, m)| m.access_count),
            EvictionStrategy::TimeBased => candidates.sort_by_key(|(_, m)| m.created_at),
            EvictionStrategy::All => unreachable!(),
        }

        let mut removed = 0;
        for (key, _) in candidates.into_iter().take(remove_count) {
            self.entries.remove(&key);
            self.meta.remove(&key);
            removed += 1;
        }
        removed
    }
}

/// A point cache registered with a [`CacheRegistry`]. Cloning the handle
/// shares the underlying cache.
pub struct TrackedCache<K, V> {
    inner: Arc<CacheState<K, V>>,
}

impl<K, V> Clone for TrackedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> TrackedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn get(&self, key: &K) -> Option<V> {
        match self.inner.entries.get(key) {
            Some(entry) => {
                let value = entry.value().clone();
                drop(entry);
                self.inner.record_access(key);
                metrics::counter!(observability::CACHE_HITS_TOTAL, "cache" => self.inner.name)
                    .increment(1);
                Some(value)
            }
            None => {
                metrics::counter!(observability::CACHE_MISSES_TOTAL, "cache" => self.inner.name)
                    .increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.entries.insert(key.clone(), value);
        self.inner.record_access(&key);
    }

    pub fn remove(&self, key: &K) {
        self.inner.entries.remove(key);
        self.inner.meta.remove(key);
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
        self.inner.meta.clear();
    }
}

/// A memoized pure function: results are cached in a [`TrackedCache`] so
/// they participate in registry-wide eviction.
pub struct Memoized<K, V, F> {
    cache: TrackedCache<K, V>,
    func: F,
}

impl<K, V, F> Memoized<K, V, F>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: Fn(&K) -> V,
{
    pub fn call(&self, key: K) -> V {
        if let Some(value) = self.cache.get(&key) {
            return value;
        }
        let value = (self.func)(&key);
        self.cache.insert(key, value.clone());
        value
    }

    pub fn cache(&self) -> &TrackedCache<K, V> {
        &self.cache
    }
}

/// Registry of every tracked cache, owned by the entity store (not a
/// process-wide global). Eviction is an explicit operation invoked at
/// defined mutation points.
pub struct CacheRegistry {
    caches: DashMap<&'static str, Arc<dyn EvictableCache>>,
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            caches: DashMap::new(),
        }
    }

    /// Create a tracked point cache registered under `name`. Registering the
    /// same name again replaces the previous registration.
    pub fn register<K, V>(&self, name: &'static str) -> TrackedCache<K, V>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let state = Arc::new(CacheState {
            name,
            entries: DashMap::new(),
            meta: DashMap::new(),
        });
        self.caches
            .insert(name, state.clone() as Arc<dyn EvictableCache>);
        TrackedCache { inner: state }
    }

    /// Wrap a pure function with a registered result cache.
    pub fn memoize<K, V, F>(&self, name: &'static str, func: F) -> Memoized<K, V, F>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
        F: Fn(&K) -> V,
    {
        Memoized {
            cache: self.register(name),
            func,
        }
    }

    /// One eviction pass over every registered cache when `signal` exceeds
    /// `threshold`. Each cache loses `max(1, ceil(len * percentage / 100))`
    /// entries chosen by `strategy` (`All` ignores the percentage).
    pub fn check_and_clear(
        &self,
        signal: usize,
        threshold: usize,
        strategy: EvictionStrategy,
        percentage: u32,
    ) {
        if signal <= threshold {
            return;
        }
        let mut evicted = 0;
        for cache in self.caches.iter() {
            evicted += cache.value().evict(strategy, percentage);
        }
        metrics::counter!(observability::CACHE_EVICTION_PASSES_TOTAL).increment(1);
        metrics::counter!(observability::CACHE_EVICTED_ENTRIES_TOTAL).increment(evicted as u64);
        tracing::debug!(signal, threshold, ?strategy, percentage, evicted, "cache eviction pass");
    }

    /// Clear every registered cache outright.
    pub fn clear_all(&self) {
        for cache in self.caches.iter() {
            cache.value().evict(EvictionStrategy::All, 100);
        }
    }

    pub fn cache_count(&self) -> usize {
        self.caches.len()
    }
}
