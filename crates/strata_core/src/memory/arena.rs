//! # Frame Arena
//!
//! A bump allocator whose budget is released all at once at end of frame.

use std::cell::Cell;

use crate::error::{CoreError, CoreResult};

/// A bump-pointer arena for per-frame simulation memory.
///
/// Allocations only bump an offset. Everything handed out is released together
/// by [`FrameArena::reset`], which takes `&mut self`: while a sim region
/// borrows the arena, the arena cannot be reset.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per simulation thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = FrameArena::new(1024 * 1024); // 1MB
///
/// let hashes = arena.alloc_slice::<u32>(8192)?;
///
/// // Release the whole frame
/// drop(hashes);
/// arena.reset();
/// ```
#[derive(Debug)]
pub struct FrameArena {
    /// Current allocation offset.
    offset: Cell<usize>,
    /// Total capacity.
    capacity: usize,
    /// Highest offset reached since creation.
    high_water: Cell<usize>,
}

impl FrameArena {
    /// Creates a new arena with the specified capacity in bytes.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Total size in bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            offset: Cell::new(0),
            capacity,
            high_water: Cell::new(0),
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current used space in bytes.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.used()
    }

    /// Returns the largest number of bytes ever in use at once.
    #[inline]
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water.get()
    }

    /// Reserves room for `count` values of `T` and returns them default-initialised.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ArenaExhausted`] when the budget cannot cover the request.
    pub fn alloc_slice<T: Default + Clone>(&self, count: usize) -> CoreResult<Vec<T>> {
        self.bump::<T>(count)?;
        Ok(vec![T::default(); count])
    }

    /// Reserves room for `count` values of `T` and returns an empty vector
    /// that can hold them without reallocating.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ArenaExhausted`] when the budget cannot cover the request.
    pub fn alloc_with_capacity<T>(&self, count: usize) -> CoreResult<Vec<T>> {
        self.bump::<T>(count)?;
        Ok(Vec::with_capacity(count))
    }

    fn bump<T>(&self, count: usize) -> CoreResult<()> {
        if count == 0 {
            return Ok(());
        }

        let size = std::mem::size_of::<T>().saturating_mul(count);
        let align = std::mem::align_of::<T>();

        let offset = self.offset.get();
        let aligned_offset = (offset + align - 1) & !(align - 1);
        let new_offset = aligned_offset.saturating_add(size);

        if new_offset > self.capacity {
            return Err(CoreError::ArenaExhausted {
                requested: new_offset - offset,
                remaining: self.capacity - offset,
            });
        }

        self.offset.set(new_offset);
        if new_offset > self.high_water.get() {
            self.high_water.set(new_offset);
        }
        Ok(())
    }

    /// Resets the arena, releasing every allocation of the frame.
    ///
    /// Requires exclusive access, so no region carved from this arena can
    /// still be alive.
    #[inline]
    pub fn reset(&mut self) {
        self.offset.set(0);
    }
}
