mod arena;
mod error;
mod identity;
mod slot;

pub use arena::Arena;
pub use error::StoreError;
pub use identity::IdentityKey;
pub use slot::{FieldCell, RecordSlot};

use crate::{
    model::ModelId,
    record::{Record, SlotId},
};
use std::collections::BTreeMap;

///
/// ModelStore
///
/// Live records of one model: the slot arena plus the identity map used for
/// upsert-by-identity. Both structures always agree; every mutation goes
/// through the paired methods below.
///

#[derive(Debug, Default)]
pub struct ModelStore {
    arena: Arena<RecordSlot>,
    identity: BTreeMap<IdentityKey, SlotId>,
}

impl ModelStore {
    #[must_use]
    pub fn find_identity(&self, key: &IdentityKey) -> Option<SlotId> {
        let id = self.identity.get(key).copied()?;
        // The arena is authoritative; a dangling identity entry is unreachable
        // because removal maintains both sides.
        self.arena.contains(id).then_some(id)
    }

    pub fn insert(&mut self, slot: RecordSlot) -> SlotId {
        let key = slot.identity.clone();
        let id = self.arena.insert(slot);
        self.identity.insert(key, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: SlotId) -> Option<&RecordSlot> {
        self.arena.get(id)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut RecordSlot> {
        self.arena.get_mut(id)
    }

    pub fn remove(&mut self, id: SlotId) -> Option<RecordSlot> {
        let slot = self.arena.remove(id)?;
        self.identity.remove(&slot.identity);
        Some(slot)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &RecordSlot)> {
        self.arena.iter()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.identity.clear();
    }
}

///
/// StoreRegistry
///
/// One [`ModelStore`] per registered model, indexed by [`ModelId`].
///

#[derive(Debug)]
pub struct StoreRegistry {
    stores: Vec<ModelStore>,
}

impl StoreRegistry {
    #[must_use]
    pub fn new(model_count: usize) -> Self {
        Self {
            stores: (0..model_count).map(|_| ModelStore::default()).collect(),
        }
    }

    #[must_use]
    pub fn store(&self, model: ModelId) -> &ModelStore {
        &self.stores[model.index()]
    }

    #[must_use]
    pub fn store_mut(&mut self, model: ModelId) -> &mut ModelStore {
        &mut self.stores[model.index()]
    }

    #[must_use]
    pub fn exists(&self, record: Record) -> bool {
        self.store(record.model).get(record.slot).is_some()
    }

    /// Resolve a handle, failing with `StaleRecord` when the slot is gone.
    pub fn slot(&self, record: Record, model_name: &str) -> Result<&RecordSlot, StoreError> {
        self.store(record.model)
            .get(record.slot)
            .ok_or_else(|| StoreError::StaleRecord {
                model: model_name.to_string(),
            })
    }

    /// Mutable variant of [`Self::slot`].
    pub fn slot_mut(
        &mut self,
        record: Record,
        model_name: &str,
    ) -> Result<&mut RecordSlot, StoreError> {
        self.store_mut(record.model)
            .get_mut(record.slot)
            .ok_or_else(|| StoreError::StaleRecord {
                model: model_name.to_string(),
            })
    }

    pub fn clear(&mut self) {
        for store in &mut self.stores {
            store.clear();
        }
    }
}
