use crate::node::field::Field;
use serde::Serialize;

///
/// Model
///
/// One record type: a name, its declared fields, and the ordered list of
/// identifying fields used to derive record identity for upsert dedup.
///

#[derive(Clone, Debug, Serialize)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    pub identifying: Vec<String>,
}

impl Model {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            identifying: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn identifying<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifying = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn get(&self, ident: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.ident == ident)
    }
}
