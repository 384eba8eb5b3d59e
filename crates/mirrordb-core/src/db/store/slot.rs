use crate::{db::store::IdentityKey, model::FieldId, record::Record, value::Value};

///
/// FieldCell
///
/// Storage for one field of one record, aligned with the model's field
/// table. Attribute cells carry the dirty flag used by the recompute
/// scheduler; relation cells hold handles only.
///

#[derive(Debug)]
pub enum FieldCell {
    Attr { value: Value, dirty: bool },
    One(Option<Record>),
    Many(Vec<Record>),
}

impl FieldCell {
    #[must_use]
    pub const fn as_one(&self) -> Option<&Option<Record>> {
        match self {
            Self::One(slot) => Some(slot),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_many(&self) -> Option<&Vec<Record>> {
        match self {
            Self::Many(members) => Some(members),
            _ => None,
        }
    }
}

///
/// RecordSlot
///
/// One record's storage: its derived identity plus one cell per field.
///

#[derive(Debug)]
pub struct RecordSlot {
    pub identity: IdentityKey,
    pub cells: Vec<FieldCell>,
}

impl RecordSlot {
    #[must_use]
    pub fn cell(&self, field: FieldId) -> &FieldCell {
        &self.cells[field.index()]
    }

    #[must_use]
    pub fn cell_mut(&mut self, field: FieldId) -> &mut FieldCell {
        &mut self.cells[field.index()]
    }

    /// Cached attribute value; `Value::None` when unset.
    #[must_use]
    pub fn attr(&self, field: FieldId) -> &Value {
        match self.cell(field) {
            FieldCell::Attr { value, .. } => value,
            _ => &Value::None,
        }
    }

    /// Dirty flag of an attribute cell (always false for relations).
    #[must_use]
    pub fn is_dirty(&self, field: FieldId) -> bool {
        matches!(self.cell(field), FieldCell::Attr { dirty: true, .. })
    }

    pub fn set_dirty(&mut self, field: FieldId, dirty: bool) {
        if let FieldCell::Attr { dirty: flag, .. } = self.cell_mut(field) {
            *flag = dirty;
        }
    }
}
