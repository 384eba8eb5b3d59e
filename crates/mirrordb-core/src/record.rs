use crate::model::ModelId;
use serde::Serialize;
use std::fmt;

///
/// SlotId
///
/// Generational index into a model's record arena. The generation is bumped
/// when a slot is freed, so handles to deleted records can never resolve
/// against a reused slot.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SlotId {
    pub index: u32,
    pub generation: u32,
}

///
/// Record
///
/// Copyable handle addressing one record. Records are only ever addressed
/// through handles; relations store handles, never owning pointers, so
/// cyclic graphs are plain edges in the arena.
///

#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Record {
    pub model: ModelId,
    pub slot: SlotId,
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Record({}:{}@{})",
            self.model.get(),
            self.slot.index,
            self.slot.generation
        )
    }
}
