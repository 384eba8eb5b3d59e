use crate::{
    db::store::StoreError,
    model::{
        AttributeModel, ComputeFn, ComputeKind, ComputeModel, DepModel, FieldId, FieldModel,
        FieldModelKind, Hooks, ModelId, RelationModel,
    },
    value::Value,
};
use mirrordb_schema::{
    build::Schema,
    node::{Dependency, FieldKind},
    types::ComputeMode,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// RegistryError
///
/// Definition-time errors raised while flattening a validated schema into
/// runtime tables. These are fatal to startup and never caught internally.
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("computed field '{model}.{field}' has no registered compute function")]
    MissingComputeFn { model: String, field: String },

    #[error("compute function registered for '{model}.{field}', which is not a computed field")]
    UnknownComputeRegistration { model: String, field: String },

    #[error("hooks registered for unknown model '{model}'")]
    UnknownHookModel { model: String },

    #[error("registry invariant violated: {0}")]
    Invariant(String),
}

///
/// Dependent
///
/// One edge of the reverse dependency graph: when the keyed field changes
/// on a record, `field` on `model` must be re-dirtied, either on the same
/// record (`via: None`) or on every record held by the changed record's
/// `via` relation slot.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dependent {
    pub model: ModelId,
    pub field: FieldId,
    pub via: Option<FieldId>,
}

///
/// ModelTable
/// Flattened runtime table for one model.
///

#[derive(Debug)]
pub struct ModelTable {
    pub name: String,
    pub fields: Vec<FieldModel>,
    by_ident: BTreeMap<String, FieldId>,
    pub identifying: Vec<FieldId>,
    pub hooks: Hooks,
}

impl ModelTable {
    pub fn field_id(&self, ident: &str) -> Result<FieldId, StoreError> {
        self.by_ident
            .get(ident)
            .copied()
            .ok_or_else(|| StoreError::UnknownField {
                model: self.name.clone(),
                field: ident.to_string(),
            })
    }

    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldModel {
        &self.fields[id.index()]
    }

    #[must_use]
    pub fn field_ident(&self, id: FieldId) -> &str {
        &self.fields[id.index()].ident
    }

    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        (0..self.fields.len()).map(|i| FieldId::new(i as u16))
    }
}

///
/// ModelRegistry
///
/// Process-wide authority for the merged field table per model and the
/// reverse compute-dependency graph. Built once from a validated schema;
/// the public API accepts names, the runtime core runs on dense ids.
///

#[derive(Debug)]
pub struct ModelRegistry {
    models: Vec<ModelTable>,
    by_name: BTreeMap<String, ModelId>,
    dependents: Vec<BTreeMap<FieldId, Vec<Dependent>>>,
}

impl ModelRegistry {
    pub fn model_id(&self, name: &str) -> Result<ModelId, StoreError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::UnknownModel {
                model: name.to_string(),
            })
    }

    #[must_use]
    pub fn table(&self, id: ModelId) -> &ModelTable {
        &self.models[id.index()]
    }

    #[must_use]
    pub fn dependents(&self, model: ModelId, field: FieldId) -> &[Dependent] {
        self.dependents[model.index()]
            .get(&field)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model_ids(&self) -> impl Iterator<Item = ModelId> + '_ {
        (0..self.models.len()).map(|i| ModelId::new(i as u16))
    }

    /// Flatten a validated schema into runtime tables, wiring registered
    /// compute functions and hooks, and build the reverse dependency graph.
    pub fn build(
        schema: &Schema,
        computes: BTreeMap<(String, String), ComputeFn>,
        hooks: BTreeMap<String, Hooks>,
    ) -> Result<Self, RegistryError> {
        // Pass 1: assign dense ids (schema iterates models in name order).
        let mut by_name = BTreeMap::new();
        let mut field_maps: Vec<BTreeMap<String, FieldId>> = Vec::new();
        for (index, model) in schema.models().enumerate() {
            by_name.insert(model.name.clone(), ModelId::new(index as u16));
            let mut map = BTreeMap::new();
            for (fi, field) in model.fields.iter().enumerate() {
                map.insert(field.ident.clone(), FieldId::new(fi as u16));
            }
            field_maps.push(map);
        }

        // Pass 2: build field models with ids resolved.
        let mut used_computes = BTreeSet::new();
        let mut models = Vec::new();
        for model in schema.models() {
            let model_id = by_name[&model.name];
            let own_fields = &field_maps[model_id.index()];

            let mut fields = Vec::new();
            for field in &model.fields {
                let kind = match &field.kind {
                    FieldKind::Attribute(ty) => {
                        let compute = build_compute(
                            model, field, own_fields, &by_name, &field_maps, &computes,
                            &mut used_computes,
                        )?;

                        FieldModelKind::Attribute(AttributeModel {
                            ty: *ty,
                            default: build_default(model, field)?,
                            required: field.required,
                            readonly: field.readonly,
                            compute,
                        })
                    }
                    FieldKind::Relation(spec) => {
                        let target = *by_name.get(&spec.target).ok_or_else(|| {
                            RegistryError::Invariant(format!(
                                "validated schema lost relation target '{}'",
                                spec.target
                            ))
                        })?;
                        let inverse = *field_maps[target.index()]
                            .get(&spec.inverse)
                            .ok_or_else(|| {
                                RegistryError::Invariant(format!(
                                    "validated schema lost inverse '{}.{}'",
                                    spec.target, spec.inverse
                                ))
                            })?;

                        FieldModelKind::Relation(RelationModel {
                            arity: spec.arity,
                            target,
                            inverse,
                            causal: spec.causal,
                            required: field.required,
                            readonly: field.readonly,
                        })
                    }
                };

                fields.push(FieldModel {
                    ident: field.ident.clone(),
                    kind,
                });
            }

            let identifying = model
                .identifying
                .iter()
                .map(|ident| {
                    own_fields.get(ident).copied().ok_or_else(|| {
                        RegistryError::Invariant(format!(
                            "validated schema lost identifying field '{}.{ident}'",
                            model.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            models.push(ModelTable {
                name: model.name.clone(),
                fields,
                by_ident: own_fields.clone(),
                identifying,
                hooks: Hooks::default(),
            });
        }

        // Every registered compute function must belong to a computed field.
        for (model, field) in computes.keys() {
            if !used_computes.contains(&(model.clone(), field.clone())) {
                return Err(RegistryError::UnknownComputeRegistration {
                    model: model.clone(),
                    field: field.clone(),
                });
            }
        }

        // Hooks attach by model name.
        for (name, model_hooks) in hooks {
            let Some(id) = by_name.get(&name) else {
                return Err(RegistryError::UnknownHookModel { model: name });
            };
            models[id.index()].hooks = model_hooks;
        }

        // Pass 3: reverse dependency graph.
        let mut dependents: Vec<BTreeMap<FieldId, Vec<Dependent>>> =
            vec![BTreeMap::new(); models.len()];
        for (mi, table) in models.iter().enumerate() {
            let model_id = ModelId::new(mi as u16);
            for field_id in table.field_ids() {
                let Some(attr) = table.field(field_id).attribute() else {
                    continue;
                };
                let Some(compute) = &attr.compute else {
                    continue;
                };

                for dep in &compute.depends {
                    let (on_model, on_field, via) = match *dep {
                        DepModel::Local(f) => (model_id, f, None),
                        DepModel::Related { relation, field } => {
                            let Some(rel) = table.field(relation).relation() else {
                                return Err(RegistryError::Invariant(format!(
                                    "related dependency of '{}.{}' does not go through a relation",
                                    table.name,
                                    table.field_ident(field_id)
                                )));
                            };
                            (rel.target, field, Some(rel.inverse))
                        }
                    };

                    let edge = Dependent {
                        model: model_id,
                        field: field_id,
                        via,
                    };
                    let edges = dependents[on_model.index()].entry(on_field).or_default();
                    if !edges.contains(&edge) {
                        edges.push(edge);
                    }
                }
            }
        }

        Ok(Self {
            models,
            by_name,
            dependents,
        })
    }
}

// Convert a declared default literal, rejecting non-finite floats.
fn build_default(
    model: &mirrordb_schema::node::Model,
    field: &mirrordb_schema::node::Field,
) -> Result<Option<Value>, RegistryError> {
    match &field.default {
        None => Ok(None),
        Some(arg) => Value::from_arg(arg).map(Some).ok_or_else(|| {
            RegistryError::Invariant(format!(
                "default for '{}.{}' is not a storable value",
                model.name, field.ident
            ))
        }),
    }
}

// Compile the compute spec (or related alias) of one attribute field.
// A related dependency implies a dependency on the relation slot itself.
#[allow(clippy::too_many_arguments)]
fn build_compute(
    model: &mirrordb_schema::node::Model,
    field: &mirrordb_schema::node::Field,
    own_fields: &BTreeMap<String, FieldId>,
    by_name: &BTreeMap<String, ModelId>,
    field_maps: &[BTreeMap<String, FieldId>],
    computes: &BTreeMap<(String, String), ComputeFn>,
    used_computes: &mut BTreeSet<(String, String)>,
) -> Result<Option<ComputeModel>, RegistryError> {
    let resolve_related = |relation: &str, remote: &str| -> Result<(FieldId, FieldId), RegistryError> {
        let rel_id = own_fields.get(relation).copied().ok_or_else(|| {
            RegistryError::Invariant(format!(
                "validated schema lost relation '{}.{relation}'",
                model.name
            ))
        })?;
        let spec = model
            .get(relation)
            .and_then(mirrordb_schema::node::Field::relation_spec)
            .ok_or_else(|| {
                RegistryError::Invariant(format!(
                    "'{}.{relation}' is not a relational field",
                    model.name
                ))
            })?;
        let target_id = by_name.get(&spec.target).copied().ok_or_else(|| {
            RegistryError::Invariant(format!(
                "validated schema lost relation target '{}'",
                spec.target
            ))
        })?;
        let remote_id = field_maps[target_id.index()]
            .get(remote)
            .copied()
            .ok_or_else(|| {
                RegistryError::Invariant(format!(
                    "validated schema lost related field '{}.{remote}'",
                    spec.target
                ))
            })?;

        Ok((rel_id, remote_id))
    };

    if let Some(related) = &field.related {
        let (relation, remote) = resolve_related(&related.relation, &related.field)?;

        return Ok(Some(ComputeModel {
            mode: ComputeMode::Lazy,
            kind: ComputeKind::Related {
                relation,
                field: remote,
            },
            depends: vec![
                DepModel::Related {
                    relation,
                    field: remote,
                },
                DepModel::Local(relation),
            ],
        }));
    }

    let Some(spec) = &field.compute else {
        return Ok(None);
    };

    let key = (model.name.clone(), field.ident.clone());
    let Some(func) = computes.get(&key).copied() else {
        return Err(RegistryError::MissingComputeFn {
            model: key.0,
            field: key.1,
        });
    };
    used_computes.insert(key);

    let mut depends = Vec::new();
    for dep in &spec.depends {
        match dep {
            Dependency::Local(name) => {
                let id = own_fields.get(name).copied().ok_or_else(|| {
                    RegistryError::Invariant(format!(
                        "validated schema lost dependency '{}.{name}'",
                        model.name
                    ))
                })?;
                if !depends.contains(&DepModel::Local(id)) {
                    depends.push(DepModel::Local(id));
                }
            }
            Dependency::Related {
                relation,
                field: remote,
            } => {
                let (relation, remote) = resolve_related(relation, remote)?;
                let related_dep = DepModel::Related {
                    relation,
                    field: remote,
                };
                if !depends.contains(&related_dep) {
                    depends.push(related_dep);
                }
                if !depends.contains(&DepModel::Local(relation)) {
                    depends.push(DepModel::Local(relation));
                }
            }
        }
    }

    Ok(Some(ComputeModel {
        mode: spec.mode,
        kind: ComputeKind::Custom(func),
        depends,
    }))
}
