//! Persistent entity records, addressed by storage index.

use strata_core::StorageIndex;

use super::WorldPosition;
use crate::entity::SimEntity;
use crate::error::{SimError, SimResult};

/// Durable record of one entity.
///
/// `sim.p` is meaningless while stored; the world position is authoritative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoredEntity {
    /// Simulation sub-state, copied in and out of sim regions.
    pub sim: SimEntity,
    /// Position in chunk space, null when non-spatial.
    pub p: WorldPosition,
}

impl StoredEntity {
    /// Wraps a template with no world position.
    #[must_use]
    pub fn new(sim: SimEntity) -> Self {
        Self {
            sim,
            p: WorldPosition::null(),
        }
    }
}

/// Dense table of stored entities. Slot 0 is the reserved null index.
#[derive(Clone, Debug)]
pub struct EntityStorage {
    records: Vec<StoredEntity>,
    max_count: usize,
}

impl EntityStorage {
    /// Creates storage that holds at most `max_count` entities.
    #[must_use]
    pub fn new(max_count: usize) -> Self {
        let mut records = Vec::with_capacity(max_count.min(1024) + 1);
        records.push(StoredEntity::new(SimEntity::default()));
        Self { records, max_count }
    }

    /// Appends a record and returns its new storage index.
    ///
    /// The record's own `storage_index` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::StorageFull`] once `max_count` entities are stored.
    pub fn add(&mut self, mut stored: StoredEntity) -> SimResult<StorageIndex> {
        if self.len() >= self.max_count {
            return Err(SimError::StorageFull {
                capacity: self.max_count,
            });
        }
        let raw = u32::try_from(self.records.len()).map_err(|_| SimError::StorageFull {
            capacity: self.max_count,
        })?;
        let index = StorageIndex::new(raw);
        stored.sim.storage_index = index;
        self.records.push(stored);
        Ok(index)
    }

    /// Record for `index`, if one exists.
    #[inline]
    #[must_use]
    pub fn get(&self, index: StorageIndex) -> Option<&StoredEntity> {
        if index.is_null() {
            return None;
        }
        self.records.get(index.get() as usize)
    }

    /// Mutable record for `index`, if one exists.
    #[inline]
    pub fn get_mut(&mut self, index: StorageIndex) -> Option<&mut StoredEntity> {
        if index.is_null() {
            return None;
        }
        self.records.get_mut(index.get() as usize)
    }

    /// Like [`Self::get`], but a missing record is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownEntity`] for the null or an unused index.
    pub fn require(&self, index: StorageIndex) -> SimResult<&StoredEntity> {
        self.get(index).ok_or(SimError::UnknownEntity(index))
    }

    /// Like [`Self::get_mut`], but a missing record is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownEntity`] for the null or an unused index.
    pub fn require_mut(&mut self, index: StorageIndex) -> SimResult<&mut StoredEntity> {
        self.get_mut(index).ok_or(SimError::UnknownEntity(index))
    }

    /// Number of stored entities (excluding the reserved slot).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len() - 1
    }

    /// Checks if no entity is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(index, record)` over every stored entity.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (StorageIndex, &StoredEntity)> {
        self.records
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, stored)| (StorageIndex::new(i as u32), stored))
    }
}
