use crate::{record::Record, value::Value};
use std::collections::BTreeMap;

///
/// FieldSnapshot
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldSnapshot {
    Value(Value),
    One(Option<Record>),
    Many(Vec<Record>),
}

///
/// RecordView
///
/// Immutable snapshot of one record with every computed field resolved.
/// Views are what predicates and hooks read; they stay valid after further
/// mutations but do not reflect them.
///

#[derive(Clone, Debug)]
pub struct RecordView {
    record: Record,
    model: String,
    fields: BTreeMap<String, FieldSnapshot>,
}

impl RecordView {
    #[must_use]
    pub(crate) fn new(
        record: Record,
        model: String,
        fields: BTreeMap<String, FieldSnapshot>,
    ) -> Self {
        Self {
            record,
            model,
            fields,
        }
    }

    #[must_use]
    pub const fn record(&self) -> Record {
        self.record
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Attribute value; `Value::None` for unknown idents and relations.
    #[must_use]
    pub fn value(&self, ident: &str) -> &Value {
        match self.fields.get(ident) {
            Some(FieldSnapshot::Value(value)) => value,
            _ => &Value::None,
        }
    }

    /// Target of a singular relation.
    #[must_use]
    pub fn one(&self, ident: &str) -> Option<Record> {
        match self.fields.get(ident) {
            Some(FieldSnapshot::One(target)) => *target,
            _ => None,
        }
    }

    /// Members of a plural relation, in link order.
    #[must_use]
    pub fn many(&self, ident: &str) -> &[Record] {
        match self.fields.get(ident) {
            Some(FieldSnapshot::Many(members)) => members,
            _ => &[],
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSnapshot)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
