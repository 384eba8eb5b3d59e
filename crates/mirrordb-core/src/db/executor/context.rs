use crate::{
    db::store::StoreRegistry,
    model::{FieldId, ModelRegistry},
    obs::event::ChangeBatch,
    record::Record,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// ChangeLog
///
/// Accumulates the per-record diff of one external call. Flushed as a
/// single [`ChangeBatch`] when the call returns, so observers only ever see
/// one consistent snapshot per mutation.
///

#[derive(Debug, Default)]
pub struct ChangeLog {
    created: Vec<Record>,
    changed: BTreeMap<Record, BTreeSet<FieldId>>,
    deleted: Vec<Record>,
}

impl ChangeLog {
    pub fn record_created(&mut self, record: Record) {
        self.created.push(record);
    }

    pub fn record_field_changed(&mut self, record: Record, field: FieldId) {
        self.changed.entry(record).or_default().insert(field);
    }

    pub fn record_deleted(&mut self, record: Record) {
        self.deleted.push(record);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.changed.is_empty() && self.deleted.is_empty()
    }

    /// Build the outgoing batch. Field ids are resolved to names; records
    /// that were created or deleted in the same call do not additionally
    /// appear as updated.
    #[must_use]
    pub fn into_batch(self, registry: &ModelRegistry) -> ChangeBatch {
        let skip: BTreeSet<Record> = self
            .created
            .iter()
            .chain(self.deleted.iter())
            .copied()
            .collect();

        let updated = self
            .changed
            .into_iter()
            .filter(|(record, _)| !skip.contains(record))
            .map(|(record, fields)| {
                let table = registry.table(record.model);
                let names = fields
                    .into_iter()
                    .map(|f| table.field_ident(f).to_string())
                    .collect();
                (record, names)
            })
            .collect();

        ChangeBatch {
            created: self.created,
            updated,
            deleted: self.deleted,
        }
    }
}

///
/// DirtyQueue
///
/// Pending eager recomputes, ordered for deterministic pass execution.
/// Lazy fields only carry their cell dirty flag and never enter the queue.
///

#[derive(Debug, Default)]
pub struct DirtyQueue {
    eager: BTreeSet<(Record, FieldId)>,
}

impl DirtyQueue {
    pub fn push(&mut self, record: Record, field: FieldId) {
        self.eager.insert((record, field));
    }

    pub fn pop(&mut self) -> Option<(Record, FieldId)> {
        self.eager.pop_first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.eager.is_empty()
    }
}

///
/// MutationCtx
///
/// Borrowed state threaded through one external mutation: the registry, the
/// stores, the change log, and the dirty queue. Everything a save, delete,
/// relation fixup, or recompute needs.
///

pub struct MutationCtx<'a> {
    pub registry: &'a ModelRegistry,
    pub stores: &'a mut StoreRegistry,
    pub log: ChangeLog,
    pub dirty: DirtyQueue,
}

impl<'a> MutationCtx<'a> {
    pub fn new(registry: &'a ModelRegistry, stores: &'a mut StoreRegistry) -> Self {
        Self {
            registry,
            stores,
            log: ChangeLog::default(),
            dirty: DirtyQueue::default(),
        }
    }
}
