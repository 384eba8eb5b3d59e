pub mod command;
pub mod compute;
pub mod data;
pub mod executor;
pub mod relation;
pub mod store;

#[cfg(test)]
mod tests;

use crate::{
    db::{
        data::Data,
        executor::{MutationCtx, SaveMode, delete, load, save},
        store::{FieldCell, StoreError, StoreRegistry},
    },
    error::Error,
    model::{ComputeFn, Hooks, ModelRegistry},
    obs::{
        metrics,
        sink::{self, SinkEvent},
    },
    record::Record,
    value::Value,
    view::RecordView,
};
use mirrordb_schema::build::Schema;
use std::collections::BTreeMap;

///
/// Db
///
/// The single authority over the live record set: merged model tables, the
/// per-model arenas, and the executors. All mutations are synchronous;
/// by the time a call returns, every relation fixup and eager recompute it
/// triggered has completed and exactly one change batch has been flushed.
///

#[derive(Debug)]
pub struct Db {
    registry: ModelRegistry,
    stores: StoreRegistry,
}

impl Db {
    #[must_use]
    pub fn builder(schema: Schema) -> DbBuilder {
        DbBuilder {
            schema,
            computes: BTreeMap::new(),
            hooks: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    // ======================================================================
    // Mutations
    // ======================================================================

    /// Create a record; errors when the identity already exists.
    pub fn create(&mut self, model: &str, data: Data) -> Result<Record, Error> {
        metrics::with_state_mut(|m| m.create_calls = m.create_calls.saturating_add(1));
        let model = self.registry.model_id(model)?;

        self.mutate(|ctx| {
            let mut victims = Vec::new();
            let record = save::save(ctx, SaveMode::Create, model, data, &mut victims)?;
            delete::process_victims(ctx, victims)?;
            Ok(record)
        })
    }

    /// Create several records in one call (one change batch).
    pub fn create_many(
        &mut self,
        model: &str,
        data: impl IntoIterator<Item = Data>,
    ) -> Result<Vec<Record>, Error> {
        metrics::with_state_mut(|m| m.create_calls = m.create_calls.saturating_add(1));
        let model = self.registry.model_id(model)?;

        self.mutate(|ctx| {
            let mut victims = Vec::new();
            let mut records = Vec::new();
            for entry in data {
                records.push(save::save(ctx, SaveMode::Create, model, entry, &mut victims)?);
            }
            delete::process_victims(ctx, victims)?;
            Ok(records)
        })
    }

    /// Upsert by identifying fields: create when absent, update when
    /// present. Same identifying data always yields the same record.
    pub fn insert(&mut self, model: &str, data: Data) -> Result<Record, Error> {
        metrics::with_state_mut(|m| m.insert_calls = m.insert_calls.saturating_add(1));
        let model = self.registry.model_id(model)?;

        self.mutate(|ctx| {
            let mut victims = Vec::new();
            let record = save::save(ctx, SaveMode::Insert, model, data, &mut victims)?;
            delete::process_victims(ctx, victims)?;
            Ok(record)
        })
    }

    /// Upsert several records in one call (one change batch).
    pub fn insert_many(
        &mut self,
        model: &str,
        data: impl IntoIterator<Item = Data>,
    ) -> Result<Vec<Record>, Error> {
        metrics::with_state_mut(|m| m.insert_calls = m.insert_calls.saturating_add(1));
        let model = self.registry.model_id(model)?;

        self.mutate(|ctx| {
            let mut victims = Vec::new();
            let mut records = Vec::new();
            for entry in data {
                records.push(save::save(ctx, SaveMode::Insert, model, entry, &mut victims)?);
            }
            delete::process_victims(ctx, victims)?;
            Ok(records)
        })
    }

    /// Apply a data payload to an existing record.
    pub fn update(&mut self, record: Record, data: Data) -> Result<(), Error> {
        metrics::with_state_mut(|m| m.update_calls = m.update_calls.saturating_add(1));

        self.mutate(|ctx| {
            let mut victims = Vec::new();
            save::update(ctx, record, data, &mut victims)?;
            delete::process_victims(ctx, victims)?;
            Ok(())
        })
    }

    /// Delete a record, detaching it from every relation; causal fields
    /// cascade. The handle goes permanently stale.
    pub fn delete(&mut self, record: Record) -> Result<(), Error> {
        metrics::with_state_mut(|m| m.delete_calls = m.delete_calls.saturating_add(1));

        self.mutate(|ctx| delete::delete(ctx, record))
    }

    /// Drop every record of every model (test teardown). Emits no events.
    pub fn clear(&mut self) {
        self.stores.clear();
    }

    // ======================================================================
    // Reads
    // ======================================================================

    #[must_use]
    pub fn exists(&self, record: Record) -> bool {
        self.stores.exists(record)
    }

    #[must_use]
    pub fn model_name(&self, record: Record) -> &str {
        &self.registry.table(record.model).name
    }

    /// Attribute value. Reading forces the field's transitive lazy
    /// dependencies to resolve first.
    pub fn get(&mut self, record: Record, field: &str) -> Result<Value, Error> {
        let table = self.registry.table(record.model);
        let field_id = table.field_id(field)?;
        if table.field(field_id).attribute().is_none() {
            return Err(StoreError::NotAnAttribute {
                model: table.name.clone(),
                field: field.to_string(),
            }
            .into());
        }

        self.read(|ctx| {
            let table = ctx.registry.table(record.model);
            let needs_force = {
                let slot = ctx.stores.slot(record, &table.name)?;
                table.field(field_id).is_computed() && slot.is_dirty(field_id)
            };
            if needs_force {
                compute::force(ctx, record, field_id)?;
            }

            let slot = ctx.stores.slot(record, &table.name)?;
            Ok(slot.attr(field_id).clone())
        })
    }

    /// Target of a singular relation.
    pub fn one(&self, record: Record, field: &str) -> Result<Option<Record>, Error> {
        let table = self.registry.table(record.model);
        let field_id = table.field_id(field)?;
        let slot = self.stores.slot(record, &table.name)?;

        match slot.cell(field_id) {
            FieldCell::One(target) => Ok(*target),
            FieldCell::Many(_) => Err(StoreError::ArityMismatch {
                model: table.name.clone(),
                field: field.to_string(),
                expected: "singular",
                actual: "plural",
            }
            .into()),
            FieldCell::Attr { .. } => Err(StoreError::NotARelation {
                model: table.name.clone(),
                field: field.to_string(),
            }
            .into()),
        }
    }

    /// Members of a plural relation, in link order.
    pub fn many(&self, record: Record, field: &str) -> Result<Vec<Record>, Error> {
        let table = self.registry.table(record.model);
        let field_id = table.field_id(field)?;
        let slot = self.stores.slot(record, &table.name)?;

        match slot.cell(field_id) {
            FieldCell::Many(members) => Ok(members.clone()),
            FieldCell::One(_) => Err(StoreError::ArityMismatch {
                model: table.name.clone(),
                field: field.to_string(),
                expected: "plural",
                actual: "singular",
            }
            .into()),
            FieldCell::Attr { .. } => Err(StoreError::NotARelation {
                model: table.name.clone(),
                field: field.to_string(),
            }
            .into()),
        }
    }

    /// Resolved snapshot of one record.
    pub fn view(&mut self, record: Record) -> Result<RecordView, Error> {
        self.read(|ctx| load::snapshot(ctx, record))
    }

    /// Every record of a model, in creation order.
    pub fn all(&self, model: &str) -> Result<Vec<Record>, Error> {
        let model = self.registry.model_id(model)?;
        Ok(self
            .stores
            .store(model)
            .iter()
            .map(|(slot, _)| Record { model, slot })
            .collect())
    }

    /// Records whose resolved view satisfies the predicate.
    pub fn filter(
        &mut self,
        model: &str,
        predicate: impl Fn(&RecordView) -> bool,
    ) -> Result<Vec<Record>, Error> {
        let records = self.all(model)?;

        self.read(|ctx| {
            let mut matches = Vec::new();
            for record in records {
                let view = load::snapshot(ctx, record)?;
                if predicate(&view) {
                    matches.push(record);
                }
            }
            Ok(matches)
        })
    }

    /// First record whose resolved view satisfies the predicate.
    pub fn find(
        &mut self,
        model: &str,
        predicate: impl Fn(&RecordView) -> bool,
    ) -> Result<Option<Record>, Error> {
        let records = self.all(model)?;

        self.read(|ctx| {
            for record in records {
                let view = load::snapshot(ctx, record)?;
                if predicate(&view) {
                    return Ok(Some(record));
                }
            }
            Ok(None)
        })
    }

    /// Resolve a record by its identifying data without creating it.
    pub fn find_by_identity(&self, model: &str, data: &Data) -> Result<Option<Record>, Error> {
        let model = self.registry.model_id(model)?;
        let table = self.registry.table(model);

        let mut values = Vec::with_capacity(table.identifying.len());
        for field in &table.identifying {
            let ident = table.field_ident(*field);
            match data.value(ident) {
                Some(value) if !value.is_none() => values.push(value.clone()),
                _ => {
                    return Err(StoreError::MissingIdentity {
                        model: table.name.clone(),
                        field: ident.to_string(),
                    }
                    .into());
                }
            }
        }

        let key = store::IdentityKey::derive(&values);
        Ok(self
            .stores
            .store(model)
            .find_identity(&key)
            .map(|slot| Record { model, slot }))
    }

    /// Number of live records of a model.
    pub fn len(&self, model: &str) -> Result<usize, Error> {
        let model = self.registry.model_id(model)?;
        Ok(self.stores.store(model).len())
    }

    pub fn is_empty(&self, model: &str) -> Result<bool, Error> {
        Ok(self.len(model)? == 0)
    }

    // ======================================================================
    // Call framing
    // ======================================================================

    // One external mutation: run the body, finish the eager recompute pass,
    // then flush the consolidated change batch, even when the body failed
    // partway, since applied mutations stay applied (fail-fast, non-atomic).
    fn mutate<R>(
        &mut self,
        f: impl FnOnce(&mut MutationCtx<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut ctx = MutationCtx::new(&self.registry, &mut self.stores);
        let result = f(&mut ctx);
        let pass = if result.is_ok() {
            compute::run_pass(&mut ctx).map_err(Error::from)
        } else {
            Ok(())
        };

        let log = std::mem::take(&mut ctx.log);
        drop(ctx);
        if !log.is_empty() {
            let batch = log.into_batch(&self.registry);
            sink::record(&SinkEvent::Batch(batch));
        }

        let value = result?;
        pass?;

        Ok(value)
    }

    // One read: lazy forcing may recompute and queue eager dependents; the
    // pass still runs so eager fields never stay stale, but no change batch
    // is flushed since reads are not mutations.
    fn read<R>(
        &mut self,
        f: impl FnOnce(&mut MutationCtx<'_>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let mut ctx = MutationCtx::new(&self.registry, &mut self.stores);
        let value = f(&mut ctx)?;
        compute::run_pass(&mut ctx)?;

        Ok(value)
    }
}

///
/// DbBuilder
///
/// Wires compute functions and lifecycle hooks onto a validated schema,
/// then builds the runtime registry and empty stores.
///

pub struct DbBuilder {
    schema: Schema,
    computes: BTreeMap<(String, String), ComputeFn>,
    hooks: BTreeMap<String, Hooks>,
}

impl DbBuilder {
    /// Register the compute function for one computed field.
    #[must_use]
    pub fn compute(mut self, model: &str, field: &str, func: ComputeFn) -> Self {
        self.computes
            .insert((model.to_string(), field.to_string()), func);
        self
    }

    /// Register lifecycle hooks for one model.
    #[must_use]
    pub fn hooks(mut self, model: &str, hooks: Hooks) -> Self {
        self.hooks.insert(model.to_string(), hooks);
        self
    }

    pub fn build(self) -> Result<Db, Error> {
        let registry = ModelRegistry::build(&self.schema, self.computes, self.hooks)?;
        let stores = StoreRegistry::new(registry.len());

        Ok(Db { registry, stores })
    }
}
