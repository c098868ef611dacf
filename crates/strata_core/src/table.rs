//! # Storage-Index Table
//!
//! Fixed-size open-addressed map from [`StorageIndex`] to a small `Copy` value
//! (an entity handle, in practice). Entries are never removed individually;
//! the whole table is dropped or cleared with its frame.
//!
//! ## Probing
//!
//! Lookups start at `hash(index) & (capacity - 1)` and walk forward one slot
//! at a time. A slot matches when it is empty or already keyed by the query,
//! so with distinct keys below capacity a lookup always lands on either the
//! existing entry or the first free slot in probe order.

use crate::error::{CoreError, CoreResult};
use crate::ids::StorageIndex;
use crate::memory::FrameArena;

/// Position of a slot inside a [`StorageIndexTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Returns the slot position.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot<V> {
    key: StorageIndex,
    value: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            key: StorageIndex::NULL,
            value: None,
        }
    }
}

/// Open-addressed, linearly probed storage-index map.
///
/// # Capacity
///
/// The capacity is a power of two fixed at creation. Callers must keep the
/// number of distinct keys below it; once every slot is bound, inserting a new
/// key fails with [`CoreError::TableFull`].
#[derive(Clone, Debug)]
pub struct StorageIndexTable<V: Copy> {
    slots: Vec<Slot<V>>,
    mask: usize,
    len: usize,
}

impl<V: Copy> StorageIndexTable<V> {
    /// Creates an empty table on the general heap.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Table capacity must be a power of two"
        );

        Self {
            slots: vec![Slot::default(); capacity],
            mask: capacity - 1,
            len: 0,
        }
    }

    /// Creates an empty table whose slots are charged to a frame arena.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidCapacity`] if `capacity` is not a power of two
    /// - [`CoreError::ArenaExhausted`] if the arena cannot hold the slots
    pub fn in_arena(arena: &FrameArena, capacity: usize) -> CoreResult<Self> {
        if !capacity.is_power_of_two() {
            return Err(CoreError::InvalidCapacity { capacity });
        }

        Ok(Self {
            slots: arena.alloc_slice::<Slot<V>>(capacity)?,
            mask: capacity - 1,
            len: 0,
        })
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of bound keys.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no key is bound.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn home(&self, key: StorageIndex) -> usize {
        // Fibonacci hashing spreads sequential indices across the table.
        (key.get().wrapping_mul(0x9E37_79B9) as usize) & self.mask
    }

    /// Finds the slot for `key`: its existing entry, or the first free slot.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NullStorageIndex`] if `key` is 0
    /// - [`CoreError::TableFull`] if every slot is bound to another key
    pub fn find_slot(&self, key: StorageIndex) -> CoreResult<SlotId> {
        if key.is_null() {
            return Err(CoreError::NullStorageIndex);
        }

        let start = self.home(key);
        for offset in 0..self.slots.len() {
            let index = (start + offset) & self.mask;
            let slot = &self.slots[index];
            if slot.key.is_null() || slot.key == key {
                return Ok(SlotId(index));
            }
        }

        Err(CoreError::TableFull {
            capacity: self.slots.len(),
        })
    }

    /// Looks up the value bound to `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: StorageIndex) -> Option<V> {
        let slot = self.find_slot(key).ok()?;
        self.slots[slot.0].value
    }

    /// Returns true if `key` is bound.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: StorageIndex) -> bool {
        self.get(key).is_some()
    }

    /// Binds `key` to `value`, overwriting in place if already bound.
    ///
    /// # Errors
    ///
    /// Same as [`StorageIndexTable::find_slot`].
    pub fn insert(&mut self, key: StorageIndex, value: V) -> CoreResult<SlotId> {
        let slot = self.find_slot(key)?;
        let entry = &mut self.slots[slot.0];
        if entry.key.is_null() {
            entry.key = key;
            self.len += 1;
        }
        entry.value = Some(value);
        Ok(slot)
    }

    /// Returns the key bound to a slot (null if the slot is free).
    #[inline]
    #[must_use]
    pub fn slot_key(&self, slot: SlotId) -> StorageIndex {
        self.slots.get(slot.0).map_or(StorageIndex::NULL, |s| s.key)
    }

    /// Returns the value stored in a slot.
    #[inline]
    #[must_use]
    pub fn slot_value(&self, slot: SlotId) -> Option<V> {
        self.slots.get(slot.0).and_then(|s| s.value)
    }

    /// Unbinds every key without releasing the slot storage.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::default();
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_insert_then_get() {
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(16);
        table.insert(StorageIndex::new(5), 50).unwrap();
        table.insert(StorageIndex::new(21), 210).unwrap();

        assert_eq!(table.get(StorageIndex::new(5)), Some(50));
        assert_eq!(table.get(StorageIndex::new(21)), Some(210));
        assert_eq!(table.get(StorageIndex::new(6)), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_null_key_rejected() {
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(8);
        assert_eq!(
            table.insert(StorageIndex::NULL, 1),
            Err(CoreError::NullStorageIndex)
        );
        assert_eq!(table.get(StorageIndex::NULL), None);
    }

    #[test]
    fn test_overwrite_keeps_slot() {
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(8);
        let first = table.insert(StorageIndex::new(3), 1).unwrap();
        let second = table.insert(StorageIndex::new(3), 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.get(StorageIndex::new(3)), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_full_table() {
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(4);
        for raw in 1..=4 {
            table.insert(StorageIndex::new(raw), raw).unwrap();
        }
        assert_eq!(
            table.insert(StorageIndex::new(99), 0),
            Err(CoreError::TableFull { capacity: 4 })
        );
        // Existing keys still resolve when the table is full
        assert_eq!(table.get(StorageIndex::new(4)), Some(4));
        assert_eq!(table.get(StorageIndex::new(99)), None);
    }

    #[test]
    fn test_lookup_is_stable_and_never_aliases() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(1024);
        let mut keys = Vec::new();

        while keys.len() < 900 {
            let raw = rng.gen_range(1..1_000_000u32);
            if keys.contains(&raw) {
                continue;
            }
            let slot = table.insert(StorageIndex::new(raw), raw).unwrap();
            keys.push(raw);
            assert_eq!(table.slot_key(slot), StorageIndex::new(raw));
        }

        for &raw in &keys {
            let key = StorageIndex::new(raw);
            let first = table.find_slot(key).unwrap();
            let again = table.find_slot(key).unwrap();
            assert_eq!(first, again);
            assert_eq!(table.slot_key(first), key);
            assert_eq!(table.slot_value(first), Some(raw));
        }
    }

    #[test]
    fn test_in_arena_charges_budget() {
        let arena = FrameArena::new(1 << 16);
        let table: StorageIndexTable<u32> = StorageIndexTable::in_arena(&arena, 256).unwrap();
        assert_eq!(table.capacity(), 256);
        assert!(arena.used() > 0);
    }

    #[test]
    fn test_in_arena_rejects_odd_capacity() {
        let arena = FrameArena::new(1 << 16);
        let err = StorageIndexTable::<u32>::in_arena(&arena, 100).unwrap_err();
        assert_eq!(err, CoreError::InvalidCapacity { capacity: 100 });
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_clear() {
        let mut table: StorageIndexTable<u32> = StorageIndexTable::with_capacity(8);
        table.insert(StorageIndex::new(1), 1).unwrap();
        table.clear();
        assert!(table.is_empty());
        assert!(!table.contains(StorageIndex::new(1)));
    }
}
