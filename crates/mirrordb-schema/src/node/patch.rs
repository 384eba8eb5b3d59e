use crate::node::field::Field;
use serde::Serialize;

///
/// ModelPatch
///
/// Field additions and overrides contributed to an existing model by an
/// optional module. Patches are merged in registration order at build time;
/// a patch field with the same ident as an earlier declaration replaces it,
/// otherwise it is appended. Patches may also append identifying fields.
///

#[derive(Clone, Debug, Serialize)]
pub struct ModelPatch {
    /// Name of the model being extended.
    pub model: String,
    pub fields: Vec<Field>,
    pub identifying: Vec<String>,
}

impl ModelPatch {
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
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
}
