use crate::{
    db::store::StoreError,
    model::{FieldId, ModelTable},
    value::Value,
    view::RecordView,
};
use std::collections::BTreeMap;

///
/// WillCreateFn
/// Runs before a record's initial values are installed; may adjust the draft.
///

pub type WillCreateFn = fn(&mut Draft<'_>);

///
/// NotifyFn
/// Observer hook: runs after create (`created`) or before delete
/// (`will_delete`) with a resolved snapshot of the record.
///

pub type NotifyFn = fn(&RecordView);

///
/// Hooks
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Hooks {
    pub will_create: Option<WillCreateFn>,
    pub created: Option<NotifyFn>,
    pub will_delete: Option<NotifyFn>,
}

///
/// Draft
///
/// Mutable view of a record's initial attribute values, keyed by field
/// ident. Only plain attributes are settable; computed fields and
/// relations are installed by the executor after the hook runs.
///

pub struct Draft<'a> {
    model: &'a ModelTable,
    values: &'a mut BTreeMap<FieldId, Value>,
}

impl<'a> Draft<'a> {
    pub(crate) fn new(model: &'a ModelTable, values: &'a mut BTreeMap<FieldId, Value>) -> Self {
        Self { model, values }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    /// Current draft value of an attribute, `Value::None` when unset.
    pub fn get(&self, ident: &str) -> Result<Value, StoreError> {
        let field = self.model.field_id(ident)?;
        Ok(self.values.get(&field).cloned().unwrap_or(Value::None))
    }

    /// Overwrite one attribute in the draft.
    pub fn set(&mut self, ident: &str, value: impl Into<Value>) -> Result<(), StoreError> {
        let field = self.model.field_id(ident)?;
        if self.model.field(field).attribute().is_none() {
            return Err(StoreError::NotAnAttribute {
                model: self.model.name.clone(),
                field: ident.to_string(),
            });
        }

        self.values.insert(field, value.into());
        Ok(())
    }
}
