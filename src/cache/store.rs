//! TTL cache storage.
//!
//! Key→value store where every entry carries its own expiry. Expired
//! entries are indistinguishable from absent ones and are evicted lazily
//! on the next lookup. There is no size bound: the key space is one entry
//! per content query, so growth is bounded by the set of distinct queries
//! the process serves.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

use metrics::counter;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) <= self.ttl
    }
}

/// In-memory key→value store with per-entry TTL.
///
/// Scoped to a single process: horizontally scaled deployments get
/// independent caches whose divergence is bounded by the TTL.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, Entry<T>>>,
    name: &'static str,
    default_ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    /// Create a named cache. The name labels hit/miss metrics.
    pub fn new(name: &'static str, default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            name,
            default_ttl,
        }
    }

    /// Store a value under `key`, overwriting any previous entry.
    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        rw_write(&self.entries, SOURCE, "set").insert(key.to_string(), entry);
    }

    /// Fetch a fresh value. Returns `None` for both absent and expired
    /// keys; an expired entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();

        {
            let entries = rw_read(&self.entries, SOURCE, "get");
            match entries.get(key) {
                Some(entry) if entry.is_fresh(now) => {
                    counter!("vetrina_cache_hit_total", "cache" => self.name).increment(1);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    counter!("vetrina_cache_miss_total", "cache" => self.name).increment(1);
                    return None;
                }
            }
        }

        // Expired: upgrade to a write lock and evict. Re-check freshness in
        // case a writer replaced the entry between the two locks.
        let mut entries = rw_write(&self.entries, SOURCE, "get.evict");
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(Instant::now()) {
                counter!("vetrina_cache_hit_total", "cache" => self.name).increment(1);
                return Some(entry.value.clone());
            }
            entries.remove(key);
            counter!("vetrina_cache_evict_total", "cache" => self.name).increment(1);
        }
        counter!("vetrina_cache_miss_total", "cache" => self.name).increment(1);
        None
    }

    /// Drop a single key, fresh or not.
    pub fn invalidate(&self, key: &str) -> bool {
        rw_write(&self.entries, SOURCE, "invalidate")
            .remove(key)
            .is_some()
    }

    /// Process-wide flush.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    /// Number of stored entries, expired ones included until next lookup.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::thread::sleep;

    use super::*;

    fn cache() -> TtlCache<String> {
        TtlCache::new("test", Duration::from_secs(60))
    }

    #[test]
    fn set_then_get_roundtrip() {
        let cache = cache();
        assert!(cache.get("k").is_none());

        cache.set("k", "v".to_string(), None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn set_always_overwrites() {
        let cache = cache();
        cache.set("k", "first".to_string(), None);
        cache.set("k", "second".to_string(), None);
        assert_eq!(cache.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn entries_expire_after_their_ttl() {
        let cache = cache();
        cache.set("k", "v".to_string(), Some(Duration::from_millis(30)));

        assert_eq!(cache.get("k").as_deref(), Some("v"));

        sleep(Duration::from_millis(60));
        assert!(cache.get("k").is_none());
        // Lazy eviction removed the entry, not just hid it.
        assert!(cache.is_empty());
    }

    #[test]
    fn per_entry_ttl_beats_the_default() {
        let cache = TtlCache::new("test", Duration::from_millis(10));
        cache.set("long", "v".to_string(), Some(Duration::from_secs(60)));
        sleep(Duration::from_millis(30));
        assert_eq!(cache.get("long").as_deref(), Some("v"));
    }

    #[test]
    fn clear_flushes_everything() {
        let cache = cache();
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn invalidate_drops_only_the_named_key() {
        let cache = cache();
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let cache = cache();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("lock should be acquired");
            panic!("poison cache lock");
        }));

        cache.set("k", "v".to_string(), None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }
}
