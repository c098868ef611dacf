//! # Entity Identities
//!
//! Two kinds of identity exist side by side:
//! - [`StorageIndex`]: stable across frames, names a persistent record
//! - [`EntityHandle`]: valid for one sim region only, indexes its entity table

/// Stable identity of an entity in persistent world storage.
///
/// Index 0 is reserved and means "no entity".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct StorageIndex(u32);

impl StorageIndex {
    /// The reserved "no entity" identity.
    pub const NULL: Self = Self(0);

    /// Wraps a raw storage index.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Checks if this is the reserved null identity.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for StorageIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to an entity inside one sim region.
///
/// A handle is only meaningful for the region that produced it. Regions borrow
/// the frame arena, so no handle can outlive the frame in safe code that keeps
/// the region around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntityHandle(u32);

impl EntityHandle {
    /// Creates a handle from a position in the region's entity table.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the table position as `usize`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_storage_index() {
        assert!(StorageIndex::NULL.is_null());
        assert!(StorageIndex::default().is_null());
        assert!(!StorageIndex::new(1).is_null());
    }

    #[test]
    fn test_storage_index_ordering() {
        assert!(StorageIndex::new(3) < StorageIndex::new(9));
        assert_eq!(StorageIndex::new(9).get(), 9);
    }

    #[test]
    fn test_handle_index() {
        let handle = EntityHandle::new(41);
        assert_eq!(handle.index(), 41);
        assert_eq!(handle.get(), 41);
    }
}
