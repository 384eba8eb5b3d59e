use crate::{
    db::{
        command::{self, RelationCommand},
        compute,
        data::{Data, FieldArg},
        executor::{ExecutorError, MutationCtx, load},
        store::{FieldCell, IdentityKey, RecordSlot, StoreError},
    },
    error::Error,
    model::{FieldId, FieldModelKind, ModelId, hooks::Draft},
    record::Record,
    value::Value,
};
use std::collections::BTreeMap;

///
/// SaveMode
///
/// `Create` fails when the identity already exists; `Insert` upserts:
/// same identifying data resolves to the same record, and the call's
/// non-identifying values apply as an update.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveMode {
    Create,
    Insert,
}

///
/// ResolvedData
/// Data payload with field names resolved and attribute values type-checked.
///

struct ResolvedData {
    attrs: Vec<(FieldId, Value)>,
    commands: Vec<(FieldId, Vec<RelationCommand>)>,
}

/// Create or upsert one record from a data payload.
pub(crate) fn save(
    ctx: &mut MutationCtx<'_>,
    mode: SaveMode,
    model: ModelId,
    data: Data,
    victims: &mut Vec<Record>,
) -> Result<Record, Error> {
    let resolved = resolve_data(ctx, model, data)?;
    let key = derive_identity(ctx, model, &resolved)?;

    if let Some(slot_id) = ctx.stores.store(model).find_identity(&key) {
        let record = Record {
            model,
            slot: slot_id,
        };

        return match mode {
            SaveMode::Create => Err(ExecutorError::RecordExists {
                model: ctx.registry.table(model).name.clone(),
            }
            .into()),
            SaveMode::Insert => {
                apply_to_existing(ctx, record, resolved, victims)?;
                Ok(record)
            }
        };
    }

    create_record(ctx, model, key, resolved, victims)
}

/// Apply a data payload to an existing record.
pub(crate) fn update(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    data: Data,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    ensure_exists(ctx, record)?;
    let resolved = resolve_data(ctx, record.model, data)?;

    apply_to_existing(ctx, record, resolved, victims)
}

// ======================================================================
// Creation
// ======================================================================

fn create_record(
    ctx: &mut MutationCtx<'_>,
    model: ModelId,
    key: IdentityKey,
    resolved: ResolvedData,
    victims: &mut Vec<Record>,
) -> Result<Record, Error> {
    let table = ctx.registry.table(model);

    // Draft: declared defaults, overridden by provided values.
    let mut draft: BTreeMap<FieldId, Value> = BTreeMap::new();
    for field in table.field_ids() {
        if let Some(attr) = table.field(field).attribute() {
            if let Some(default) = &attr.default {
                draft.insert(field, default.clone());
            }
        }
    }
    for (field, value) in &resolved.attrs {
        let attr = table.field(*field).attribute();
        if attr.is_some_and(|a| a.compute.is_some()) {
            return Err(readonly(ctx, model, *field).into());
        }
        draft.insert(*field, value.clone());
    }

    if let Some(hook) = table.hooks.will_create {
        let mut d = Draft::new(table, &mut draft);
        hook(&mut d);
    }

    // The hook must not move the record to another identity.
    for field in &table.identifying {
        let expected = identity_value(&resolved, *field);
        if draft.get(field) != expected.as_ref() {
            return Err(ExecutorError::IdentityViolation {
                model: table.name.clone(),
                field: table.field_ident(*field).to_string(),
            }
            .into());
        }
    }

    // Required attributes must be satisfied once defaults and the hook ran.
    for field in table.field_ids() {
        if let Some(attr) = table.field(field).attribute() {
            if attr.required
                && attr.compute.is_none()
                && draft.get(&field).is_none_or(Value::is_none)
            {
                return Err(ExecutorError::RequiredViolation {
                    model: table.name.clone(),
                    field: table.field_ident(field).to_string(),
                }
                .into());
            }
        }
    }

    let cells = table
        .field_ids()
        .map(|field| match &table.field(field).kind {
            FieldModelKind::Attribute(_) => FieldCell::Attr {
                value: draft.remove(&field).unwrap_or(Value::None),
                dirty: false,
            },
            FieldModelKind::Relation(rel) => {
                if rel.arity.is_singular() {
                    FieldCell::One(None)
                } else {
                    FieldCell::Many(Vec::new())
                }
            }
        })
        .collect();

    let slot_id = ctx.stores.store_mut(model).insert(RecordSlot {
        identity: key,
        cells,
    });
    let record = Record {
        model,
        slot: slot_id,
    };
    ctx.log.record_created(record);

    // Initial computes run in the creation pass.
    compute::mark_all_computed(ctx, record);

    for (field, commands) in resolved.commands {
        command::apply(ctx, record, field, commands, victims)?;
    }

    check_required_relations(ctx, record)?;

    if let Some(hook) = ctx.registry.table(model).hooks.created {
        let view = load::snapshot(ctx, record)?;
        hook(&view);
    }

    Ok(record)
}

// ======================================================================
// Update / upsert-apply
// ======================================================================

fn apply_to_existing(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    resolved: ResolvedData,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let model = record.model;
    let table = ctx.registry.table(model);

    for (field, value) in resolved.attrs {
        let current = {
            let slot = ctx.stores.slot(record, &table.name)?;
            slot.attr(field).clone()
        };
        // Writing the current value back is a no-op, never a violation, so
        // repeating an insert payload stays idempotent.
        if current == value {
            continue;
        }

        if table.identifying.contains(&field) {
            return Err(ExecutorError::IdentityViolation {
                model: table.name.clone(),
                field: table.field_ident(field).to_string(),
            }
            .into());
        }
        let attr = table
            .field(field)
            .attribute()
            .ok_or_else(|| not_an_attribute(ctx, model, field))?;
        if attr.readonly || attr.compute.is_some() {
            return Err(readonly(ctx, model, field).into());
        }
        if attr.required && value.is_none() {
            return Err(ExecutorError::RequiredViolation {
                model: table.name.clone(),
                field: table.field_ident(field).to_string(),
            }
            .into());
        }

        let slot = ctx.stores.slot_mut(record, &table.name)?;
        *slot.cell_mut(field) = FieldCell::Attr {
            value,
            dirty: false,
        };
        ctx.log.record_field_changed(record, field);
        compute::mark_dependents(ctx, record, field);
    }

    let touched_relations: Vec<FieldId> = resolved.commands.iter().map(|(f, _)| *f).collect();
    for (field, commands) in resolved.commands {
        let rel = table
            .field(field)
            .relation()
            .ok_or_else(|| not_a_relation(ctx, model, field))?;
        if rel.readonly {
            return Err(readonly(ctx, model, field).into());
        }

        command::apply(ctx, record, field, commands, victims)?;
    }

    // A command sequence may not leave a required singular relation empty.
    for field in touched_relations {
        check_required_relation(ctx, record, field)?;
    }

    Ok(())
}

// ======================================================================
// Payload resolution
// ======================================================================

// Resolve field names and type-check attribute values. Unknown fields and
// mismatched payload shapes fail fast here, before any mutation.
fn resolve_data(
    ctx: &MutationCtx<'_>,
    model: ModelId,
    data: Data,
) -> Result<ResolvedData, Error> {
    let table = ctx.registry.table(model);
    let mut attrs = Vec::new();
    let mut commands = Vec::new();

    for (name, arg) in data.into_entries() {
        let field = table.field_id(&name)?;
        match arg {
            FieldArg::Value(value) => {
                let attr = table
                    .field(field)
                    .attribute()
                    .ok_or_else(|| not_an_attribute(ctx, model, field))?;
                if !value.tag().satisfies(attr.ty) {
                    return Err(StoreError::TypeMismatch {
                        model: table.name.clone(),
                        field: name,
                        expected: attr.ty,
                        got: value.tag(),
                    }
                    .into());
                }
                attrs.push((field, value));
            }
            FieldArg::Commands(cmds) => {
                if table.field(field).relation().is_none() {
                    return Err(not_a_relation(ctx, model, field).into());
                }
                commands.push((field, cmds));
            }
        }
    }

    Ok(ResolvedData { attrs, commands })
}

// Identity values in declaration order; every identifying field must carry
// a non-none value in the payload.
fn derive_identity(
    ctx: &MutationCtx<'_>,
    model: ModelId,
    resolved: &ResolvedData,
) -> Result<IdentityKey, Error> {
    let table = ctx.registry.table(model);
    let mut values = Vec::with_capacity(table.identifying.len());

    for field in &table.identifying {
        let value = identity_value(resolved, *field);
        match value {
            Some(value) if !value.is_none() => values.push(value),
            _ => {
                return Err(StoreError::MissingIdentity {
                    model: table.name.clone(),
                    field: table.field_ident(*field).to_string(),
                }
                .into());
            }
        }
    }

    Ok(IdentityKey::derive(&values))
}

// Last provided value wins, matching data-map semantics.
fn identity_value(resolved: &ResolvedData, field: FieldId) -> Option<Value> {
    resolved
        .attrs
        .iter()
        .rev()
        .find(|(f, _)| *f == field)
        .map(|(_, v)| v.clone())
}

// ======================================================================
// Checks
// ======================================================================

fn check_required_relations(ctx: &MutationCtx<'_>, record: Record) -> Result<(), Error> {
    let table = ctx.registry.table(record.model);
    for field in table.field_ids() {
        check_required_relation(ctx, record, field)?;
    }

    Ok(())
}

fn check_required_relation(
    ctx: &MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Result<(), Error> {
    let table = ctx.registry.table(record.model);
    let Some(rel) = table.field(field).relation() else {
        return Ok(());
    };
    if !rel.required || !rel.arity.is_singular() {
        return Ok(());
    }

    let slot = ctx.stores.slot(record, &table.name)?;
    if matches!(slot.cell(field), FieldCell::One(None)) {
        return Err(ExecutorError::RequiredViolation {
            model: table.name.clone(),
            field: table.field_ident(field).to_string(),
        }
        .into());
    }

    Ok(())
}

fn ensure_exists(ctx: &MutationCtx<'_>, record: Record) -> Result<(), StoreError> {
    if ctx.stores.exists(record) {
        Ok(())
    } else {
        Err(StoreError::StaleRecord {
            model: ctx.registry.table(record.model).name.clone(),
        })
    }
}

fn readonly(ctx: &MutationCtx<'_>, model: ModelId, field: FieldId) -> ExecutorError {
    let table = ctx.registry.table(model);
    ExecutorError::ReadonlyViolation {
        model: table.name.clone(),
        field: table.field_ident(field).to_string(),
    }
}

fn not_an_attribute(ctx: &MutationCtx<'_>, model: ModelId, field: FieldId) -> StoreError {
    let table = ctx.registry.table(model);
    StoreError::NotAnAttribute {
        model: table.name.clone(),
        field: table.field_ident(field).to_string(),
    }
}

fn not_a_relation(ctx: &MutationCtx<'_>, model: ModelId, field: FieldId) -> StoreError {
    let table = ctx.registry.table(model);
    StoreError::NotARelation {
        model: table.name.clone(),
        field: table.field_ident(field).to_string(),
    }
}
