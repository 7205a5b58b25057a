#![forbid(unsafe_code)]

//! Bounded, thread-safe cache of notification capabilities.
//!
//! # Design
//!
//! [`AdapterCache`] maps an object's identity to its [`Capability`] so that
//! repeated chain walks over the same object reuse one adapter. Entries live
//! in an [`lru::LruCache`] guarded by a single mutex; every operation takes
//! the lock once.
//!
//! Keys are data-pointer addresses. Each resident entry holds a strong
//! reference to its object, so an address cannot be recycled by a new
//! allocation while the entry is cached.
//!
//! # Invariants
//!
//! 1. At most `capacity` entries are resident.
//! 2. A hit refreshes the entry's recency; inserting into a full cache evicts
//!    exactly the least-recently-used entry.
//! 3. The factory runs at most once per resident key.
//! 4. Objects without any capability are never cached.
//!
//! # Failure Modes
//!
//! - **Capacity churn**: walks over more distinct objects than `capacity`
//!   re-adapt evicted objects. Results stay correct; only reuse is lost.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};

use lru::LruCache;

use crate::capability::Capability;
use crate::error::{ObserveError, Result};
use crate::lock;
use crate::value::{ObjectRef, object_id};

/// Default number of resident entries.
pub const DEFAULT_CAPACITY: usize = 25;

/// Environment variable read by [`CacheConfig::from_env`].
pub const CAPACITY_ENV: &str = "PATHWATCH_ADAPTER_CACHE_CAPACITY";

/// Configuration for an [`AdapterCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resident entries.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Read the capacity from [`CAPACITY_ENV`], falling back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(CAPACITY_ENV).ok().as_deref())
    }

    /// Parse a raw environment value. Missing, malformed, or zero values
    /// yield the default.
    #[must_use]
    pub fn from_env_value(raw: Option<&str>) -> Self {
        let capacity = raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_CAPACITY);
        Self { capacity }
    }
}

/// Hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheInner {
    entries: LruCache<usize, Capability>,
    stats: CacheStats,
}

/// LRU cache from object identity to [`Capability`].
pub struct AdapterCache {
    inner: Mutex<CacheInner>,
}

impl AdapterCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.capacity).ok_or(ObserveError::ZeroCapacity)?;
        Ok(Self::with_nonzero(capacity))
    }

    fn with_nonzero(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// The process-wide cache, sized from [`CacheConfig::from_env`] on
    /// first use.
    pub fn global() -> &'static Arc<AdapterCache> {
        static GLOBAL: OnceLock<Arc<AdapterCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let capacity =
                NonZeroUsize::new(CacheConfig::from_env().capacity).unwrap_or(NonZeroUsize::MIN);
            Arc::new(Self::with_nonzero(capacity))
        })
    }

    /// Capability for `object`, adapting and caching it on a miss.
    pub fn get(&self, object: &ObjectRef) -> Option<Capability> {
        self.get_or_insert_with(object, Capability::adapt)
    }

    /// Like [`get`](Self::get) with a caller-supplied factory. The factory
    /// runs under the cache lock and only on a miss; a `None` result is not
    /// cached.
    pub fn get_or_insert_with(
        &self,
        object: &ObjectRef,
        factory: impl FnOnce(&ObjectRef) -> Option<Capability>,
    ) -> Option<Capability> {
        let key = object_id(object);
        let mut inner = lock(&self.inner);
        if let Some(capability) = inner.entries.get(&key) {
            let capability = capability.clone();
            inner.stats.hits += 1;
            return Some(capability);
        }
        inner.stats.misses += 1;

        let capability = factory(object)?;
        if let Some((evicted, _)) = inner.entries.push(key, capability.clone()) {
            if evicted != key {
                inner.stats.evictions += 1;
                tracing::trace!(message = "adapter_cache.evict", evicted, inserted = key);
            }
        }
        Some(capability)
    }

    /// Whether `object` is resident. Does not touch recency.
    #[must_use]
    pub fn contains(&self, object: &ObjectRef) -> bool {
        lock(&self.inner).entries.contains(&object_id(object))
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        lock(&self.inner).entries.cap().get()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        lock(&self.inner).stats
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        lock(&self.inner).entries.clear();
    }
}

impl std::fmt::Debug for AdapterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("AdapterCache")
            .field("len", &inner.entries.len())
            .field("capacity", &inner.entries.cap())
            .field("stats", &inner.stats)
            .finish()
    }
}
