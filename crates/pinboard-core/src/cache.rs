//! Host-owned cache for derived media assets (thumbnails, decoded frames).

use crate::item::{ContentRef, ItemStore};
use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;

/// Capacity used when a host asks for zero entries.
const MIN_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

/// Capacity-bounded LRU keyed by content reference.
pub struct AssetCache<V> {
    entries: LruCache<ContentRef, V>,
}

impl<V> AssetCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(MIN_CAPACITY)),
        }
    }

    /// Look up an asset, marking it most recently used.
    pub fn get(&mut self, key: &ContentRef) -> Option<&V> {
        self.entries.get(key)
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: &ContentRef) -> Option<&V> {
        self.entries.peek(key)
    }

    /// Insert an asset. Returns the least recently used entry if one was evicted.
    pub fn insert(&mut self, key: ContentRef, value: V) -> Option<(ContentRef, V)> {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return None;
        }
        let evicted = self.entries.push(key, value);
        if let Some((key, _)) = &evicted {
            log::trace!("Evicted cached asset {}", key);
        }
        evicted
    }

    pub fn remove(&mut self, key: &ContentRef) -> Option<V> {
        self.entries.pop(key)
    }

    pub fn contains(&self, key: &ContentRef) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries whose content is no longer on the board. Returns how many were dropped.
    pub fn retain_referenced(&mut self, store: &ItemStore) -> usize {
        let referenced: BTreeSet<&ContentRef> = store.items().map(|item| &item.content_ref).collect();
        let stale: Vec<ContentRef> = self
            .entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !referenced.contains(key))
            .cloned()
            .collect();
        for key in &stale {
            self.entries.pop(key);
        }
        stale.len()
    }
}

impl<V> std::fmt::Debug for AssetCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .finish()
    }
}
