//! # World Storage
//!
//! Persistent home of every entity, outside any sim region:
//! - [`World`]: sparse chunk grid recording which entities live where
//! - [`EntityStorage`]: dense table of [`StoredEntity`] records by storage index
//!
//! ## Chunk Space
//!
//! A [`WorldPosition`] is a chunk coordinate plus an offset from that chunk's
//! center. Offsets are kept canonical, inside half a chunk on every axis, so
//! positions far from the origin keep full float precision.

mod storage;

use std::collections::HashMap;

use strata_core::StorageIndex;
use strata_shared::V3;

pub use storage::{EntityStorage, StoredEntity};

/// Storage indices per entity block.
pub const ENTITIES_PER_BLOCK: usize = 16;

/// Chunk coordinate value marking a null position.
const CHUNK_UNINITIALIZED: i32 = i32::MAX;

/// Position in chunk space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldPosition {
    /// Chunk X.
    pub chunk_x: i32,
    /// Chunk Y.
    pub chunk_y: i32,
    /// Chunk Z (floor).
    pub chunk_z: i32,
    /// Offset from the chunk center, in meters.
    pub offset: V3,
}

impl WorldPosition {
    /// The center of chunk (0, 0, 0).
    pub const ORIGIN: Self = Self {
        chunk_x: 0,
        chunk_y: 0,
        chunk_z: 0,
        offset: V3::ZERO,
    };

    /// The position of an entity that is nowhere.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            chunk_x: CHUNK_UNINITIALIZED,
            chunk_y: 0,
            chunk_z: 0,
            offset: V3::ZERO,
        }
    }

    /// Returns false for the null position.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.chunk_x != CHUNK_UNINITIALIZED
    }

    /// The chunk this position lies in.
    #[inline]
    #[must_use]
    pub const fn chunk(&self) -> ChunkCoord {
        ChunkCoord::new(self.chunk_x, self.chunk_y, self.chunk_z)
    }
}

impl Default for WorldPosition {
    fn default() -> Self {
        Self::null()
    }
}

/// Identifies one chunk of the world grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks).
    pub x: i32,
    /// Y coordinate (in chunks).
    pub y: i32,
    /// Z coordinate (in chunks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Fixed-size run of storage indices inside a chunk.
#[derive(Clone, Copy, Debug)]
struct EntityBlock {
    count: usize,
    indices: [StorageIndex; ENTITIES_PER_BLOCK],
}

impl EntityBlock {
    const EMPTY: Self = Self {
        count: 0,
        indices: [StorageIndex::NULL; ENTITIES_PER_BLOCK],
    };

    fn as_slice(&self) -> &[StorageIndex] {
        &self.indices[..self.count]
    }
}

/// Entities resident in one chunk. New entries go into the last block.
#[derive(Clone, Debug, Default)]
struct Chunk {
    blocks: Vec<EntityBlock>,
}

impl Chunk {
    fn insert(&mut self, index: StorageIndex) {
        match self.blocks.last_mut() {
            Some(block) if block.count < ENTITIES_PER_BLOCK => {
                block.indices[block.count] = index;
                block.count += 1;
            }
            _ => {
                let mut block = EntityBlock::EMPTY;
                block.indices[0] = index;
                block.count = 1;
                self.blocks.push(block);
            }
        }
    }

    /// Removes `index`, back-filling its place from the last block.
    fn remove(&mut self, index: StorageIndex) -> bool {
        let found = self.blocks.iter().enumerate().find_map(|(b, block)| {
            block
                .as_slice()
                .iter()
                .position(|&candidate| candidate == index)
                .map(|slot| (b, slot))
        });
        let Some((block_index, slot)) = found else {
            return false;
        };

        let Some(last) = self.blocks.last_mut() else {
            return false;
        };
        last.count -= 1;
        let replacement = last.indices[last.count];
        last.indices[last.count] = StorageIndex::NULL;
        if last.count == 0 {
            self.blocks.pop();
        }
        if let Some(block) = self.blocks.get_mut(block_index) {
            if slot < block.count {
                block.indices[slot] = replacement;
            }
        }
        true
    }

    fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Sparse grid of chunks holding the storage indices of resident entities.
#[derive(Clone, Debug)]
pub struct World {
    chunk_dim: V3,
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl World {
    /// Creates an empty world with the given chunk size in meters.
    ///
    /// # Panics
    ///
    /// Panics if any chunk dimension is not positive.
    #[must_use]
    pub fn new(chunk_dim: V3) -> Self {
        assert!(
            chunk_dim.x > 0.0 && chunk_dim.y > 0.0 && chunk_dim.z > 0.0,
            "Chunk dimensions must be positive"
        );
        Self {
            chunk_dim,
            chunks: HashMap::new(),
        }
    }

    /// Size of one chunk in meters.
    #[inline]
    #[must_use]
    pub const fn chunk_dim(&self) -> V3 {
        self.chunk_dim
    }

    /// Number of chunks that hold at least one entity.
    #[must_use]
    pub fn occupied_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Maps `base` moved by `offset` meters back into canonical chunk space.
    #[must_use]
    pub fn map_into_chunk_space(&self, base: WorldPosition, offset: V3) -> WorldPosition {
        map_into_chunk_space(self.chunk_dim, base, offset)
    }

    /// Displacement from `b` to `a` in meters.
    #[must_use]
    pub fn subtract(&self, a: &WorldPosition, b: &WorldPosition) -> V3 {
        subtract(self.chunk_dim, a, b)
    }

    /// Storage indices of the entities resident in one chunk.
    pub fn query_chunk_entities(
        &self,
        coord: ChunkCoord,
    ) -> impl Iterator<Item = StorageIndex> + '_ {
        self.chunks
            .get(&coord)
            .into_iter()
            .flat_map(|chunk| chunk.blocks.iter())
            .flat_map(|block| block.as_slice().iter().copied())
    }

    /// Moves an entity between chunks and records its new position.
    ///
    /// A null `new_p` takes the entity out of the grid and marks the stored
    /// record non-spatial. A valid one puts it back in space.
    pub fn change_entity_location(
        &mut self,
        index: StorageIndex,
        stored: &mut StoredEntity,
        new_p: WorldPosition,
    ) {
        let old_p = stored.p;
        let same_chunk = old_p.is_valid() && new_p.is_valid() && old_p.chunk() == new_p.chunk();

        if !same_chunk {
            if old_p.is_valid() {
                let coord = old_p.chunk();
                if let Some(chunk) = self.chunks.get_mut(&coord) {
                    let removed = chunk.remove(index);
                    debug_assert!(removed, "entity missing from its chunk");
                    if chunk.is_empty() {
                        self.chunks.remove(&coord);
                    }
                }
            }
            if new_p.is_valid() {
                self.chunks.entry(new_p.chunk()).or_default().insert(index);
            }
        }

        if new_p.is_valid() {
            stored.p = new_p;
            stored.sim.flags.remove(crate::entity::EntityFlags::NONSPATIAL);
        } else {
            stored.p = WorldPosition::null();
            stored.sim.flags.insert(crate::entity::EntityFlags::NONSPATIAL);
        }
    }
}

/// Snaps one axis so its offset lies within half a chunk of the center.
fn recanonicalize_coord(chunk_dim: f32, chunk: &mut i32, offset: &mut f32) {
    #[allow(clippy::cast_possible_truncation)]
    let step = (*offset / chunk_dim).round() as i32;
    *chunk += step;
    #[allow(clippy::cast_precision_loss)]
    let shift = step as f32 * chunk_dim;
    *offset -= shift;
}

/// Free-function form of [`World::map_into_chunk_space`].
#[must_use]
pub fn map_into_chunk_space(chunk_dim: V3, base: WorldPosition, offset: V3) -> WorldPosition {
    let mut result = base;
    result.offset += offset;
    recanonicalize_coord(chunk_dim.x, &mut result.chunk_x, &mut result.offset.x);
    recanonicalize_coord(chunk_dim.y, &mut result.chunk_y, &mut result.offset.y);
    recanonicalize_coord(chunk_dim.z, &mut result.chunk_z, &mut result.offset.z);
    result
}

/// Free-function form of [`World::subtract`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn subtract(chunk_dim: V3, a: &WorldPosition, b: &WorldPosition) -> V3 {
    let d_chunk = V3::new(
        (a.chunk_x - b.chunk_x) as f32,
        (a.chunk_y - b.chunk_y) as f32,
        (a.chunk_z - b.chunk_z) as f32,
    );
    chunk_dim.hadamard(d_chunk) + (a.offset - b.offset)
}
