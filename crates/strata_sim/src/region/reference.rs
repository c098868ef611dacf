//! Conversion of entity references at the region boundary.
//!
//! Stored records only ever hold [`EntityReference::Unresolved`]. Pull-in
//! resolves a reference to a handle, pulling the target in if needed;
//! commit turns the handle back into the target's storage index.

use strata_core::StorageIndex;

use super::SimRegion;
use crate::entity::EntityReference;
use crate::error::SimResult;
use crate::state::WorldState;
use crate::world::EntityStorage;

impl SimRegion<'_> {
    /// Resolves `reference` against this region, pulling its target in if it
    /// is not present yet. A null reference stays null.
    ///
    /// # Errors
    ///
    /// Same as [`SimRegion::add_entity`].
    pub fn load_reference(
        &mut self,
        storage: &mut EntityStorage,
        reference: EntityReference,
    ) -> SimResult<EntityReference> {
        match reference {
            EntityReference::Unresolved(index) if index.is_null() => Ok(EntityReference::NONE),
            EntityReference::Unresolved(index) => {
                let handle = self.add_entity_to(storage, index, None)?;
                Ok(EntityReference::Resolved(handle))
            }
            EntityReference::Resolved(handle) => {
                // Already resolved; make sure it belongs to this region.
                self.entity(handle)?;
                Ok(reference)
            }
        }
    }

    /// Same as [`SimRegion::load_reference`], taking the whole world state.
    ///
    /// # Errors
    ///
    /// Same as [`SimRegion::add_entity`].
    pub fn load_reference_in(
        &mut self,
        state: &mut WorldState,
        reference: EntityReference,
    ) -> SimResult<EntityReference> {
        self.load_reference(&mut state.entities, reference)
    }

    /// Converts `reference` to its stable form.
    ///
    /// A handle that does not name an entity of this region stores as null.
    #[must_use]
    pub fn store_reference(&self, reference: EntityReference) -> EntityReference {
        match reference {
            EntityReference::Resolved(handle) => EntityReference::Unresolved(
                self.entity(handle)
                    .map_or(StorageIndex::NULL, |entity| entity.storage_index),
            ),
            unresolved @ EntityReference::Unresolved(_) => unresolved,
        }
    }
}
