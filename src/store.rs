//! In-process key-value store with per-entry expiry and a bounded size.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Entries held when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10_000;

struct TtlEnvelope {
    stored_at: Instant,
    expires_at: Option<Instant>,
    value: Vec<u8>,
}

impl TtlEnvelope {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Once `capacity` entries are held, storing a new key first drops expired
/// entries and then, if still full, the oldest one.
pub struct MemoryStore {
    entries: DashMap<String, TtlEnvelope>,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: DashMap::new(), capacity: capacity.max(1) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        self.entries.remove_if(key, |_, envelope| envelope.expired(now));
        self.entries.get(key).map(|envelope| envelope.value.clone())
    }

    /// Store `value`, returning the live value it replaced.
    pub fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Option<Vec<u8>> {
        let now = Instant::now();
        if !self.entries.contains_key(key) && self.entries.len() >= self.capacity {
            self.make_room(now);
        }

        let envelope = TtlEnvelope { stored_at: now, expires_at: ttl.map(|ttl| now + ttl), value: value.to_vec() };
        self.entries
            .insert(key.to_string(), envelope)
            .filter(|previous| !previous.expired(now))
            .map(|previous| previous.value)
    }

    fn make_room(&self, now: Instant) {
        self.entries.retain(|_, envelope| !envelope.expired(now));
        if self.entries.len() < self.capacity {
            return;
        }

        // the iterator holds shard locks, so the key is cloned out before removal
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(key = %key, "evicted oldest cache entry");
        }
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, envelope| !envelope.expired(now));
        before.saturating_sub(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire() {
        let store = MemoryStore::new();
        store.set("_stop_4407", b"[]", Some(Duration::ZERO));
        store.set("_stops", b"{}", None);

        assert_eq!(store.get("_stop_4407"), None);
        assert_eq!(store.get("_stops"), Some(b"{}".to_vec()));
    }

    #[test]
    fn set_returns_live_previous() {
        let store = MemoryStore::new();
        assert_eq!(store.set("k", b"1", None), None);
        assert_eq!(store.set("k", b"2", Some(Duration::ZERO)), Some(b"1".to_vec()));
        assert_eq!(store.set("k", b"3", None), None);
    }

    #[test]
    fn purge_drops_expired() {
        let store = MemoryStore::new();
        store.set("a", b"1", Some(Duration::ZERO));
        store.set("b", b"2", Some(Duration::from_secs(60)));

        assert_eq!(store.purge(), 1);
        assert_eq!(store.get("b"), Some(b"2".to_vec()));

        store.delete("b");
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn bounded_by_capacity() {
        let store = MemoryStore::with_capacity(2);
        store.set("_near_1", b"a", None);
        std::thread::sleep(Duration::from_millis(2));
        store.set("_near_2", b"b", None);
        std::thread::sleep(Duration::from_millis(2));
        store.set("_near_3", b"c", None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("_near_1"), None);
        assert_eq!(store.get("_near_3"), Some(b"c".to_vec()));

        // replacing a held key evicts nothing
        store.set("_near_3", b"d", None);
        assert_eq!(store.get("_near_2"), Some(b"b".to_vec()));
    }

    #[test]
    fn expired_entries_make_room_first() {
        let store = MemoryStore::with_capacity(2);
        store.set("_find_forbes", b"a", None);
        store.set("_stop_4407", b"[]", Some(Duration::ZERO));
        store.set("_find_fifth", b"b", None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("_find_forbes"), Some(b"a".to_vec()));
    }
}
