//! Memoizing result cache with TTL expiry and bounded, age-based eviction.
//!
//! A [`ResultCache`] is constructed once by its owner (normally the
//! [`Engine`](crate::Engine)), shared by reference and torn down with
//! [`ResultCache::clear`] or by dropping it. It is never authoritative: any
//! entry may be dropped at any time and is simply recomputed.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Add;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_TTL_SECS: i64 = 300;
pub const DEFAULT_CAPACITY: usize = 1000;

/// Share of entries removed when purging expired entries did not free room.
const EVICT_PERCENT: usize = 30;

/// A cached value and the time it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    created: DateTime<Utc>,
    // write order, breaks timestamp ties
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created >= ttl
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub valid_count: usize,
    pub expired_count: usize,
    pub hits: u64,
    pub misses: u64,
}

impl Add for CacheStats {
    type Output = CacheStats;

    fn add(self, other: CacheStats) -> CacheStats {
        CacheStats {
            size: self.size + other.size,
            valid_count: self.valid_count + other.valid_count,
            expired_count: self.expired_count + other.expired_count,
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
        }
    }
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

#[derive(Debug)]
pub struct ResultCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        ResultCache {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
                hits: 0,
                misses: 0,
            }),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// The lock is held while `compute` runs so a key is computed at most once
    /// per TTL window; `compute` must not call back into the same cache.
    pub fn memoize<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        self.memoize_at(key, Utc::now(), compute)
    }

    /// [`memoize`](Self::memoize) against an explicit clock reading.
    pub fn memoize_at<F>(&self, key: K, now: DateTime<Utc>, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(entry) = inner.entries.get(&key) {
            if !entry.is_expired(now, self.ttl) {
                inner.hits += 1;
                return entry.value.clone();
            }
        }
        inner.misses += 1;

        let value = compute();
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            self.evict(inner, now);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                created: now,
                seq,
            },
        );
        value
    }

    /// Peek at a live entry without computing anything.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Utc::now();
        self.lock()
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .map(|entry| entry.value.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.lock();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        log::debug!("Cache cleared, dropped {dropped} entries");
    }

    /// Remove entries whose TTL has run out, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before - inner.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        let inner = self.lock();
        let expired_count = inner
            .entries
            .values()
            .filter(|entry| entry.is_expired(now, self.ttl))
            .count();
        CacheStats {
            size: inner.entries.len(),
            valid_count: inner.entries.len() - expired_count,
            expired_count,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Make room for one insert: expired entries first, then the oldest 30%.
    fn evict(&self, inner: &mut Inner<K, V>, now: DateTime<Utc>) {
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let expired = before - inner.entries.len();

        let mut aged = 0;
        if inner.entries.len() >= self.capacity {
            let mut by_age: Vec<(DateTime<Utc>, u64, K)> = inner
                .entries
                .iter()
                .map(|(key, entry)| (entry.created, entry.seq, key.clone()))
                .collect();
            by_age.sort_by_key(|(created, seq, _)| (*created, *seq));
            let count = (by_age.len() * EVICT_PERCENT).div_ceil(100).max(1);
            for (_, _, key) in by_age.into_iter().take(count) {
                inner.entries.remove(&key);
                aged += 1;
            }
        }
        log::debug!("Cache eviction: {expired} expired, {aged} oldest removed");
    }

    // a poisoned lock only means another caller panicked mid-compute; the
    // map itself is still consistent
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
