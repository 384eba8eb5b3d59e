use crate::{
    db::store::{FieldCell, StoreRegistry},
    model::ModelRegistry,
    record::Record,
    value::Value,
};

///
/// ComputeCtx
///
/// Read-only view handed to compute functions. The scheduler resolves every
/// declared dependency before invoking the function, so reads here return
/// clean cached values. Reads of undeclared fields return whatever is
/// cached and are a declaration bug, not a runtime condition.
///

pub struct ComputeCtx<'a> {
    registry: &'a ModelRegistry,
    stores: &'a StoreRegistry,
    record: Record,
}

impl<'a> ComputeCtx<'a> {
    pub(crate) const fn new(
        registry: &'a ModelRegistry,
        stores: &'a StoreRegistry,
        record: Record,
    ) -> Self {
        Self {
            registry,
            stores,
            record,
        }
    }

    #[must_use]
    pub const fn record(&self) -> Record {
        self.record
    }

    /// Attribute value of the computing record; `Value::None` when unset or
    /// when the ident does not name an attribute.
    #[must_use]
    pub fn value(&self, ident: &str) -> Value {
        self.value_of(self.record, ident)
    }

    /// Attribute value of any record, `Value::None` for stale handles.
    #[must_use]
    pub fn value_of(&self, record: Record, ident: &str) -> Value {
        let table = self.registry.table(record.model);
        let Ok(field) = table.field_id(ident) else {
            return Value::None;
        };
        self.stores
            .store(record.model)
            .get(record.slot)
            .map_or(Value::None, |slot| slot.attr(field).clone())
    }

    /// Target of a singular relation on the computing record.
    #[must_use]
    pub fn one(&self, ident: &str) -> Option<Record> {
        let table = self.registry.table(self.record.model);
        let field = table.field_id(ident).ok()?;
        let slot = self.stores.store(self.record.model).get(self.record.slot)?;
        match slot.cell(field) {
            FieldCell::One(target) => *target,
            _ => None,
        }
    }

    /// Members of a plural relation on the computing record, in link order.
    #[must_use]
    pub fn many(&self, ident: &str) -> Vec<Record> {
        let table = self.registry.table(self.record.model);
        let Ok(field) = table.field_id(ident) else {
            return Vec::new();
        };
        self.stores
            .store(self.record.model)
            .get(self.record.slot)
            .and_then(|slot| slot.cell(field).as_many().cloned())
            .unwrap_or_default()
    }
}
