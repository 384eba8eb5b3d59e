use crate::{db::command::RelationCommand, value::Value};

///
/// FieldArg
///
/// One field's payload in a data map: a plain value for attributes, or an
/// ordered command sequence for relational fields.
///

#[derive(Debug)]
pub enum FieldArg {
    Value(Value),
    Commands(Vec<RelationCommand>),
}

///
/// Data
///
/// Ordered field payload for `create`/`insert`/`update`. Order is preserved
/// because relational command sequences apply left-to-right, and a later
/// entry for the same field wins.
///

#[derive(Debug, Default)]
pub struct Data {
    entries: Vec<(String, FieldArg)>,
}

impl Data {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one attribute value.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .push((field.into(), FieldArg::Value(value.into())));
        self
    }

    /// Queue relational commands for one field, applied left-to-right.
    #[must_use]
    pub fn apply(
        mut self,
        field: impl Into<String>,
        commands: impl IntoIterator<Item = RelationCommand>,
    ) -> Self {
        self.entries.push((
            field.into(),
            FieldArg::Commands(commands.into_iter().collect()),
        ));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldArg)> {
        self.entries.iter()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, FieldArg)> {
        self.entries
    }

    /// Plain attribute value for one field, if present.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.entries.iter().rev().find_map(|(name, arg)| {
            if name == field {
                match arg {
                    FieldArg::Value(value) => Some(value),
                    FieldArg::Commands(_) => None,
                }
            } else {
                None
            }
        })
    }
}
