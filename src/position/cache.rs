//! Position cache: Token → (row, col) with TTL and generation checks.

use super::Generation;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    row: usize,
    col: usize,
    inserted_at: Instant,
    generation: u64,
}

/// Bounded, time-limited cache of resolved positions.
///
/// An entry is a hit only while it is younger than the TTL and was stored
/// under the current [`Generation`]. When a new key is inserted at
/// capacity, the oldest-inserted entry is evicted (FIFO, not LRU).
#[derive(Debug)]
pub struct PositionCache<K> {
    entries: Mutex<IndexMap<K, Entry>>,
    ttl: Duration,
    max_entries: usize,
    generation: Generation,
}

impl<K: Hash + Eq + Clone> PositionCache<K> {
    /// Create an empty cache.
    ///
    /// # Arguments
    ///
    /// * `ttl` - How long an entry stays valid.
    /// * `max_entries` - Capacity; at least one entry is always kept.
    /// * `generation` - Counter shared with whoever detects content changes.
    pub fn new(ttl: Duration, max_entries: usize, generation: Generation) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            ttl,
            max_entries: max_entries.max(1),
            generation,
        }
    }

    /// Look up a position. Expired or outdated entries are removed.
    pub fn get(&self, token: &K) -> Option<(usize, usize)> {
        let mut entries = self.entries.lock();
        let entry = *entries.get(token)?;

        if entry.inserted_at.elapsed() < self.ttl && entry.generation == self.generation.current() {
            Some((entry.row, entry.col))
        } else {
            entries.shift_remove(token);
            None
        }
    }

    /// Store a position for `token`, stamped with now and the current generation.
    pub fn set(&self, token: K, row: usize, col: usize) {
        self.set_at_generation(token, row, col, self.generation.current());
    }

    /// Store a position computed under an earlier generation. If the
    /// generation has moved on since, the entry is never a hit.
    pub(crate) fn set_at_generation(&self, token: K, row: usize, col: usize, generation: u64) {
        let entry = Entry {
            row,
            col,
            inserted_at: Instant::now(),
            generation,
        };

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get_mut(&token) {
            *existing = entry;
            return;
        }
        if entries.len() >= self.max_entries {
            entries.shift_remove_index(0);
        }
        entries.insert(token, entry);
    }

    /// Drop the entry for `token`.
    pub fn invalidate(&self, token: &K) {
        self.entries.lock().shift_remove(token);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries (stale ones included until looked up).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
