//! # memtable
//!
//! The in-memory write buffer for the RiptideKV-U64 storage engine.
//!
//! [`OrderedIndex`] is the balanced-tree layer (C1 in the component split):
//! a thin, infallible wrapper over `BTreeMap<u64, u64>` with last-write-wins
//! insert semantics. [`Memtable`] (C2) adds a capacity bound on top of it —
//! the engine fills a memtable until it is full, then drains it in sorted
//! order into a new SST.
//!
//! Neither layer knows about deletes as a distinct operation: a delete is
//! just a `put(key, TOMBSTONE)` performed by the caller (the `engine`
//! crate), so the memtable's own contract stays pure in-memory with no
//! error surface.
//!
//! ## Example
//! ```rust
//! use memtable::Memtable;
//!
//! let mut m = Memtable::new(3);
//! assert!(m.put(1, 10).is_accepted());
//! assert!(m.put(2, 20).is_accepted());
//! assert!(m.put(3, 30).is_accepted());
//! assert!(m.put(4, 40).is_rejected());
//!
//! assert_eq!(m.get(1), 10);
//! assert_eq!(m.drain_sorted(), vec![(1, 10), (2, 20), (3, 30)]);
//! ```

use kvcore::{Key, Value, INVALID};
use std::collections::BTreeMap;

/// Any balanced BST over 64-bit keys would satisfy this contract; a
/// `BTreeMap` already is one, so there is nothing to build beyond this thin
/// wrapper that pins down the required operations and their semantics.
#[derive(Debug, Clone, Default)]
pub struct OrderedIndex {
    map: BTreeMap<Key, Value>,
}

impl OrderedIndex {
    /// Creates a new, empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Inserts `(k, v)`. Last write wins: a prior value for `k` is replaced.
    pub fn insert(&mut self, k: Key, v: Value) {
        self.map.insert(k, v);
    }

    /// Returns the value for `k`, or [`INVALID`] if `k` is not present.
    #[must_use]
    pub fn get(&self, k: Key) -> Value {
        self.map.get(&k).copied().unwrap_or(INVALID)
    }

    /// Returns every KV pair with `k1 <= k <= k2`, in ascending key order.
    #[must_use]
    pub fn range(&self, k1: Key, k2: Key) -> Vec<(Key, Value)> {
        if k1 > k2 {
            return Vec::new();
        }
        self.map
            .range(k1..=k2)
            .map(|(&k, &v)| (k, v))
            .collect()
    }

    /// Smallest key currently present, if any.
    #[must_use]
    pub fn min_key(&self) -> Option<Key> {
        self.map.keys().next().copied()
    }

    /// Largest key currently present, if any.
    #[must_use]
    pub fn max_key(&self) -> Option<Key> {
        self.map.keys().next_back().copied()
    }

    /// Number of distinct keys currently present.
    #[must_use]
    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// `true` if `k` is present in the index.
    #[must_use]
    pub fn contains(&self, k: Key) -> bool {
        self.map.contains_key(&k)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Borrowing iterator over entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, Value)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

/// Outcome of [`Memtable::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    /// The write was recorded. The memtable may now be at capacity.
    Accepted,
    /// The memtable was already full; the write was not recorded.
    Rejected,
}

impl PutResult {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, PutResult::Accepted)
    }

    #[must_use]
    pub fn is_rejected(self) -> bool {
        matches!(self, PutResult::Rejected)
    }
}

/// A bounded wrapper over [`OrderedIndex`]: accepts writes until
/// `max_entries` distinct keys are held, after which every further `put`
/// is rejected until the caller drains and resets it.
///
/// The bound is checked *after* inserting: a write that brings the
/// memtable exactly to `max_entries` is still accepted. Only a write that
/// would require the memtable to already be at or over `max_entries`
/// before insertion is rejected.
#[derive(Debug)]
pub struct Memtable {
    index: OrderedIndex,
    max_entries: usize,
}

impl Memtable {
    /// Creates an empty memtable bounded at `max_entries` distinct keys.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            index: OrderedIndex::new(),
            max_entries,
        }
    }

    /// Attempts to record `(k, v)`.
    ///
    /// Checks capacity against the size *before* this call: if the
    /// memtable is already full, the write is rejected and nothing
    /// changes. Otherwise the pair is inserted (overwriting any existing
    /// value for `k`) and the write is accepted, even if this insertion
    /// brings the memtable to exactly `max_entries`.
    pub fn put(&mut self, k: Key, v: Value) -> PutResult {
        if !self.index.contains(k) && self.index.size() >= self.max_entries {
            return PutResult::Rejected;
        }
        self.index.insert(k, v);
        PutResult::Accepted
    }

    /// Returns the value for `k`, or [`INVALID`] if absent.
    #[must_use]
    pub fn get(&self, k: Key) -> Value {
        self.index.get(k)
    }

    /// Returns every KV pair with `k1 <= k <= k2`, in ascending key order.
    #[must_use]
    pub fn scan(&self, k1: Key, k2: Key) -> Vec<(Key, Value)> {
        self.index.range(k1, k2)
    }

    /// Drains every entry in strictly ascending key order and clears the
    /// memtable. This is the canonical source for flushing to an SST.
    pub fn drain_sorted(&mut self) -> Vec<(Key, Value)> {
        let out: Vec<(Key, Value)> = self.index.iter().collect();
        self.index.clear();
        out
    }

    /// Clears the memtable without returning its contents.
    pub fn reset(&mut self) {
        self.index.clear();
    }

    /// Number of distinct keys currently held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.index.size()
    }

    /// Configured capacity.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// `true` if the memtable holds zero keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }
}
