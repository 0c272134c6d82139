use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<K>,
}

/// Fixed capacity map that evicts the oldest insertion when full and treats entries older than
/// the ttl as absent.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A zero `ttl` never expires.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity.min(1024)),
                order: VecDeque::new(),
            }),
            capacity,
            ttl: (!ttl.is_zero()).then_some(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let fresh = match inner.entries.get(key) {
            Some(entry) => self
                .ttl
                .map_or(true, |ttl| entry.inserted_at.elapsed() < ttl),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        if !fresh {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!("stale cache entry dropped");
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };
        if inner.entries.insert(key.clone(), entry).is_some() {
            // replaced in place; the original insertion position stands
            return;
        }
        inner.order.push_back(key);
        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            trace!(capacity = self.capacity, "evicted oldest cache entry");
        }
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
            capacity: self.capacity,
        }
    }
}
