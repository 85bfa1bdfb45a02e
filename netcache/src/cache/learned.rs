//! Fixed-capacity learned cache.
//!
//! One slot per bucket, addressed by `fnv(key) % capacity`. There is no
//! chaining: a key landing on an occupied slot replaces the occupant, which
//! keeps lookup and update at a single slot access.
//!
//! Each slot keeps its `{key, value}` pair in one 64-bit atomic word, so a
//! reader sees either the old pair or the new one and never a mix. The valid
//! flag only ever goes from false to true and is published after the first
//! pair is stored.

use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use fnv::FnvHasher;
use netcache_common::{Key, Value};

use super::error::{CacheError, Result};

fn pack(key: Key, value: Value) -> u64 {
    (u64::from(key) << 32) | u64::from(value)
}

fn unpack(word: u64) -> (Key, Value) {
    ((word >> 32) as Key, word as Value)
}

/// FNV-1a over the key's network byte order representation.
pub fn slot_hash(key: Key) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(&key.to_be_bytes());
    hasher.finish()
}

#[derive(Default)]
struct Slot {
    entry: AtomicU64,
    valid: AtomicBool,
}

/// What an `update` did to its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotUpdate {
    /// slot was empty
    Filled,
    /// slot already held this key
    Refreshed,
    /// slot held another key, which is now gone
    Replaced { evicted: Key },
}

pub struct LearnedCache {
    slots: Box<[Slot]>,
}

impl LearnedCache {
    pub fn new(capacity: usize) -> Result<LearnedCache> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        let slots = (0..capacity).map(|_| Slot::default()).collect();
        Ok(LearnedCache { slots })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_index(&self, key: Key) -> usize {
        (slot_hash(key) % self.slots.len() as u64) as usize
    }

    /// Hit only if the slot is valid and holds `key`. A slot held by a
    /// different key is a plain miss.
    pub fn lookup(&self, key: Key) -> Option<Value> {
        let slot = &self.slots[self.slot_index(key)];
        if !slot.valid.load(Ordering::Acquire) {
            return None;
        }
        let (stored, value) = unpack(slot.entry.load(Ordering::Acquire));
        (stored == key).then_some(value)
    }

    /// Unconditionally writes `key -> value` into the key's slot. Only call
    /// this for values the server confirmed as found.
    ///
    /// The returned outcome is for logging. When two writers race to fill an
    /// empty slot, both may report `Filled`. A `Replaced` always names a key
    /// that really occupied the slot.
    pub fn update(&self, key: Key, value: Value) -> SlotUpdate {
        let slot = &self.slots[self.slot_index(key)];
        // Once valid is seen set, the word swapped out below is a stored
        // pair, never the empty placeholder.
        let was_valid = slot.valid.load(Ordering::Acquire);
        let previous = slot.entry.swap(pack(key, value), Ordering::AcqRel);
        slot.valid.store(true, Ordering::Release);
        if !was_valid {
            return SlotUpdate::Filled;
        }
        let (evicted, _) = unpack(previous);
        if evicted == key {
            SlotUpdate::Refreshed
        } else {
            SlotUpdate::Replaced { evicted }
        }
    }

    /// Number of valid slots.
    pub fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.valid.load(Ordering::Relaxed))
            .count()
    }
}
