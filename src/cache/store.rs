//! LRU Cache Module
//!
//! Bounded, thread-safe key-value cache with least-recently-used eviction.
//! A key map points into a `RecencyList` holding the entries; one mutex
//! guards both, and every critical section is a map lookup plus a list splice.
//!
//! Every `put` and `remove` bumps a write generation. A reader that misses
//! notes the generation before going to the backend and fills through
//! `put_if_unchanged`, which refuses the fill if any write landed meanwhile,
//! so a slow read can never resurrect a value that was deleted or replaced.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

use crate::cache::lru::{RecencyList, SlotId};
use crate::cache::CacheStats;
use crate::error::{KvError, Result};

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

#[derive(Debug)]
struct Inner<K, V> {
    index: HashMap<K, SlotId>,
    order: RecencyList<Entry<K, V>>,
    stats: CacheStats,
    generation: u64,
}

impl<K: Hash + Eq + Clone, V> Inner<K, V> {
    fn insert(&mut self, key: K, value: V, capacity: usize) {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            self.order.move_to_front(id);
            return;
        }

        if self.index.len() >= capacity {
            if let Some(evicted) = self.order.pop_back() {
                self.index.remove(&evicted.key);
                self.stats.record_eviction();
            }
        }

        let id = self.order.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
    }
}

// == LRU Cache ==
/// Fixed-capacity cache shared between request threads.
#[derive(Debug)]
pub struct LruCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries (at least 1).
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(KvError::InvalidCapacity(
                "cache capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                index: HashMap::with_capacity(capacity),
                order: RecencyList::with_capacity(capacity),
                stats: CacheStats::new(capacity),
                generation: 0,
            }),
            capacity,
        })
    }

    // == Get ==
    /// Returns a clone of the cached value and marks it most recently used.
    ///
    /// A miss has no effect beyond the miss counter.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let Some(&id) = inner.index.get(key) else {
            inner.stats.record_miss();
            return None;
        };

        inner.order.move_to_front(id);
        inner.stats.record_hit();
        inner.order.get(id).map(|entry| entry.value.clone())
    }

    // == Put ==
    /// Inserts or overwrites a value and marks it most recently used.
    ///
    /// Inserting a new key into a full cache first evicts the least recently
    /// used entry.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.insert(key, value, self.capacity);
    }

    /// Current write generation, to be passed to `put_if_unchanged`.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Inserts like `put`, but only if no `put` or `remove` happened since
    /// `seen` was read from `generation`. Returns whether the value was stored.
    ///
    /// Generations are cache-wide, so a write to any key cancels the fill.
    /// The caller then simply misses again next time.
    pub fn put_if_unchanged(&self, key: K, value: V, seen: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != seen {
            return false;
        }
        inner.insert(key, value, self.capacity);
        true
    }

    // == Remove ==
    /// Drops the entry for `key`; returns whether one was present.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        match inner.index.remove(key) {
            Some(id) => {
                inner.order.remove(id);
                true
            }
            None => false,
        }
    }

    /// Checks for a key without touching recency or counters.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().index.contains_key(key)
    }

    /// Snapshot of the keys from most to least recently used.
    ///
    /// Walks every entry under the lock; meant for diagnostics and tests, not
    /// the request path.
    pub fn keys(&self) -> Vec<K> {
        self.inner
            .lock()
            .order
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.entries = inner.index.len();
        stats
    }
}
