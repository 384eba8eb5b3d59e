use crate::{
    error::ErrorTree,
    node::{Model, ModelPatch},
    validate::validate_schema,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// BuildError
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("duplicate model '{0}'")]
    DuplicateModel(String),

    #[error("patch targets unknown model '{0}'")]
    UnknownPatchTarget(String),

    #[error("validation failed: {0}")]
    Validation(ErrorTree),
}

///
/// Schema
///
/// The merged, validated model set. Obtained only through
/// [`SchemaBuilder::build`]; downstream code may rely on every invariant
/// the validation pass enforces (inverse symmetry, resolvable targets,
/// well-formed compute dependencies, non-empty identifying lists).
///

#[derive(Clone, Debug, Serialize)]
pub struct Schema {
    models: BTreeMap<String, Model>,
}

impl Schema {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

///
/// SchemaBuilder
///
/// Collects base model definitions and patches, then merges and validates
/// in one step. Merge order is registration order; later patches override
/// same-named fields from earlier declarations.
///

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    models: Vec<Model>,
    patches: Vec<ModelPatch>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    #[must_use]
    pub fn patch(mut self, patch: ModelPatch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Merge patches into their base models, then validate the flattened
    /// field tables. The returned [`Schema`] is the single source of truth
    /// for the runtime registry.
    pub fn build(self) -> Result<Schema, BuildError> {
        let mut models: BTreeMap<String, Model> = BTreeMap::new();

        for model in self.models {
            if models.contains_key(&model.name) {
                return Err(BuildError::DuplicateModel(model.name));
            }
            models.insert(model.name.clone(), model);
        }

        for patch in self.patches {
            let Some(base) = models.get_mut(&patch.model) else {
                return Err(BuildError::UnknownPatchTarget(patch.model));
            };
            merge_patch(base, patch);
        }

        let schema = Schema { models };
        validate_schema(&schema)
            .result()
            .map_err(BuildError::Validation)?;

        Ok(schema)
    }
}

// Apply one patch to its base model: override by ident, append otherwise.
// Identifying additions are appended in patch order, skipping duplicates.
fn merge_patch(base: &mut Model, patch: ModelPatch) {
    for field in patch.fields {
        match base.fields.iter_mut().find(|f| f.ident == field.ident) {
            Some(existing) => *existing = field,
            None => base.fields.push(field),
        }
    }

    for ident in patch.identifying {
        if !base.identifying.contains(&ident) {
            base.identifying.push(ident);
        }
    }
}

///
/// TESTS
///
