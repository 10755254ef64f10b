//! Time-bounded in-process caches with an injectable clock.

use std::{
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant according to this clock.
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Start a manual clock at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Key/value cache whose entries expire `ttl` after being stored.
///
/// A zero TTL disables caching: every lookup misses.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry<V>) -> bool {
        self.clock.now().saturating_duration_since(entry.stored_at) < self.ttl
    }

    /// Return a clone of the cached value when it has not expired yet.
    pub fn get(&self, key: &K) -> Option<V> {
        let fresh = {
            let entry = self.entries.get(key)?;
            self.is_fresh(&entry).then(|| entry.value.clone())
        };

        if fresh.is_none() {
            self.entries.remove_if(key, |_, entry| !self.is_fresh(entry));
        }
        fresh
    }

    /// Store a value, restarting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.insert(key, entry);
    }

    /// Mutate a fresh entry in place without touching its TTL.
    ///
    /// Returns `None` when the key is missing or expired.
    pub fn update<R>(&self, key: &K, apply: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut entry = self.entries.get_mut(key)?;
        if !self.is_fresh(&entry) {
            return None;
        }
        Some(apply(&mut entry.value))
    }

    /// Keys whose entries are still fresh.
    pub fn fresh_keys(&self) -> Vec<K> {
        self.entries
            .iter()
            .filter(|entry| self.is_fresh(entry.value()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Drop one entry.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl: Duration) -> (Arc<ManualClock>, TtlCache<&'static str, u32>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(ttl, clock.clone());
        (clock, cache)
    }

    #[test]
    fn entries_expire_after_ttl() {
        let (clock, cache) = cache(Duration::from_secs(60));
        cache.insert("teams", 3);

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get(&"teams"), Some(3));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"teams"), None);
    }

    #[test]
    fn insert_restarts_the_ttl() {
        let (clock, cache) = cache(Duration::from_secs(10));
        cache.insert("teams", 1);
        clock.advance(Duration::from_secs(8));
        cache.insert("teams", 2);
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get(&"teams"), Some(2));
    }

    #[test]
    fn zero_ttl_never_hits() {
        let (_clock, cache) = cache(Duration::ZERO);
        cache.insert("teams", 1);
        assert_eq!(cache.get(&"teams"), None);
    }

    #[test]
    fn update_only_touches_fresh_entries() {
        let (clock, cache) = cache(Duration::from_secs(10));
        cache.insert("teams", 1);

        let bumped = cache.update(&"teams", |value| {
            *value += 1;
            *value
        });
        assert_eq!(bumped, Some(2));
        assert_eq!(cache.get(&"teams"), Some(2));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.update(&"teams", |value| *value), None);
        assert_eq!(cache.update(&"missing", |value| *value), None);
    }

    #[test]
    fn invalidate_drops_entries() {
        let (_clock, cache) = cache(Duration::from_secs(10));
        cache.insert("teams", 1);
        cache.insert("matches", 2);

        cache.invalidate(&"teams");
        assert_eq!(cache.get(&"teams"), None);
        assert_eq!(cache.get(&"matches"), Some(2));

        cache.invalidate_all();
        assert_eq!(cache.get(&"matches"), None);
    }

    #[test]
    fn fresh_keys_skip_expired_entries() {
        let (clock, cache) = cache(Duration::from_secs(10));
        cache.insert("teams", 1);
        clock.advance(Duration::from_secs(6));
        cache.insert("matches", 2);
        clock.advance(Duration::from_secs(6));

        assert_eq!(cache.fresh_keys(), vec!["matches"]);
    }
}
