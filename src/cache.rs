//! Direct-mapped cache for memoizing diagram operations.
//!
//! Fixed size, no chaining: a new entry evicts whatever occupied its slot.
//! The full key is kept in the slot and compared on lookup, so a hash
//! collision costs a miss, never a wrong result.

use std::cell::Cell;

use crate::hash::StableHash;

struct Slot<K, V> {
    key: K,
    value: V,
}

pub struct OpCache<K, V> {
    slots: Vec<Option<Slot<K, V>>>,
    bitmask: u64,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<K, V> OpCache<K, V> {
    /// Create a cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "cache bits must be in 0..=31");

        let size = 1usize << bits;
        Self {
            slots: std::iter::repeat_with(|| None).take(size).collect(),
            bitmask: (size - 1) as u64,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.slots.fill_with(|| None);
    }

    fn slot_of(&self, key: &K) -> usize
    where
        K: StableHash,
    {
        (key.stable_hash() & self.bitmask) as usize
    }
}

impl<K: StableHash + Eq, V: Copy> OpCache<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        match &self.slots[self.slot_of(key)] {
            Some(slot) if slot.key == *key => {
                self.hits.set(self.hits.get() + 1);
                Some(slot.value)
            }
            _ => {
                self.misses.set(self.misses.get() + 1);
                None
            }
        }
    }

    pub fn insert(&mut self, key: &K, value: V)
    where
        K: Copy,
    {
        let slot = self.slot_of(key);
        self.slots[slot] = Some(Slot { key: *key, value });
    }
}
