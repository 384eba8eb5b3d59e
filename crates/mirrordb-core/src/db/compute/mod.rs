mod ctx;

pub use ctx::ComputeCtx;

use crate::{
    db::{
        executor::MutationCtx,
        store::{FieldCell, StoreError},
    },
    model::{ComputeKind, ComputeModel, DepModel, FieldId},
    obs::{
        metrics,
        sink::{self, SinkEvent},
    },
    record::Record,
    value::Value,
};
use mirrordb_schema::types::ComputeMode;
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ComputeError
///
/// Recompute-graph errors. A cycle is a programming error in the model's
/// compute declarations: the pass stops, the field keeps its last-known-good
/// value, and callers must not catch and retry.
///

#[derive(Debug, ThisError)]
pub enum ComputeError {
    #[error("recompute cycle through '{model}.{field}'")]
    Cycle { model: String, field: String },

    #[error("compute for '{model}.{field}' returned {got}, field is {expected}")]
    BadValue {
        model: String,
        field: String,
        expected: mirrordb_schema::types::AttributeType,
        got: crate::value::ValueTag,
    },

    #[error(transparent)]
    StoreError(#[from] StoreError),
}

///
/// Pass
/// State of one recompute pass: the in-progress stack used for re-entrancy
/// detection and the computed set enforcing at-most-once per pass.
///

#[derive(Debug, Default)]
struct Pass {
    stack: Vec<(Record, FieldId)>,
    computed: BTreeSet<(Record, FieldId)>,
}

/// Mark every computed field of a freshly created record dirty and queue the
/// eager ones, so initial computes run in the creation pass.
pub(crate) fn mark_all_computed(ctx: &mut MutationCtx<'_>, record: Record) {
    let table = ctx.registry.table(record.model);
    let computed: Vec<FieldId> = table
        .field_ids()
        .filter(|f| table.field(*f).is_computed())
        .collect();

    for field in computed {
        let _ = mark_field(ctx, record, field);
    }
}

/// Propagate a change of `field` on `record` to every dependent computed
/// field. Marking continues transitively through lazy fields (they will not
/// recompute now, so they cannot forward the diff themselves) and stops at
/// eager fields, whose recompute in this pass propagates further only when
/// the value actually changed. The dirty flag doubles as the visited set,
/// so diamond dependencies terminate.
pub(crate) fn mark_dependents(ctx: &mut MutationCtx<'_>, record: Record, field: FieldId) {
    let mut work = vec![(record, field)];

    while let Some((rec, fld)) = work.pop() {
        // Dependents are declared per (model, field); resolve the records
        // they live on before marking.
        let edges: Vec<_> = ctx.registry.dependents(rec.model, fld).to_vec();
        for edge in edges {
            let targets: Vec<Record> = match edge.via {
                None => vec![rec],
                Some(via) => {
                    let Some(slot) = ctx.stores.store(rec.model).get(rec.slot) else {
                        continue;
                    };
                    match slot.cell(via) {
                        FieldCell::One(Some(holder)) => vec![*holder],
                        FieldCell::One(None) => Vec::new(),
                        FieldCell::Many(members) => members.clone(),
                        FieldCell::Attr { .. } => Vec::new(),
                    }
                }
            };

            for target in targets {
                if mark_field(ctx, target, edge.field) == Some(ComputeMode::Lazy) {
                    work.push((target, edge.field));
                }
            }
        }
    }
}

// Set one computed cell dirty, queueing it when eager. Returns the field's
// mode on a fresh mark, `None` when it was already dirty (propagation
// already visited it) or is not computed.
fn mark_field(ctx: &mut MutationCtx<'_>, record: Record, field: FieldId) -> Option<ComputeMode> {
    let table = ctx.registry.table(record.model);
    let compute = table.field(field).attribute().and_then(|a| a.compute.as_ref())?;
    let mode = compute.mode;

    let slot = ctx.stores.store_mut(record.model).get_mut(record.slot)?;
    if slot.is_dirty(field) {
        // Keep the queue entry alive in case a pass already consumed it.
        if mode == ComputeMode::Eager {
            ctx.dirty.push(record, field);
        }
        return None;
    }
    slot.set_dirty(field, true);

    if mode == ComputeMode::Eager {
        ctx.dirty.push(record, field);
    }

    Some(mode)
}

/// Run the eager portion of the pending recompute work. Called once per
/// external mutation; everything it recomputes lands in the same change
/// batch the mutation emits.
pub(crate) fn run_pass(ctx: &mut MutationCtx<'_>) -> Result<(), ComputeError> {
    let mut pass = Pass::default();
    while let Some((record, field)) = ctx.dirty.pop() {
        resolve(ctx, &mut pass, record, field)?;
    }

    Ok(())
}

/// Force one field clean for a read, resolving its transitive lazy
/// dependencies first. Reads run their own pass.
pub(crate) fn force(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Result<(), ComputeError> {
    let mut pass = Pass::default();
    resolve(ctx, &mut pass, record, field)
}

// Recompute one dirty field after resolving its declared dependencies.
// Re-entry through the in-progress stack, or a re-dirty of an
// already-computed field, is a cycle.
fn resolve(
    ctx: &mut MutationCtx<'_>,
    pass: &mut Pass,
    record: Record,
    field: FieldId,
) -> Result<(), ComputeError> {
    let table = ctx.registry.table(record.model);

    // A record deleted mid-pass is stale, not an error: the in-flight
    // compute aborts instead of writing to a dead slot.
    let Some(slot) = ctx.stores.store(record.model).get(record.slot) else {
        return Ok(());
    };
    if !slot.is_dirty(field) {
        return Ok(());
    }

    let key = (record, field);
    if pass.stack.contains(&key) || pass.computed.contains(&key) {
        metrics::with_state_mut(|m| m.recompute_cycles = m.recompute_cycles.saturating_add(1));
        sink::record(&SinkEvent::RecomputeCycle {
            model: table.name.clone(),
            field: table.field_ident(field).to_string(),
        });

        return Err(ComputeError::Cycle {
            model: table.name.clone(),
            field: table.field_ident(field).to_string(),
        });
    }
    pass.stack.push(key);

    let compute = compute_model(ctx, record, field);
    let depends: Vec<DepModel> = compute.map(|c| c.depends.clone()).unwrap_or_default();

    // Dependencies first, so the compute function reads clean values only.
    for dep in depends {
        match dep {
            DepModel::Local(f) => {
                if is_dirty_computed(ctx, record, f) {
                    resolve(ctx, pass, record, f)?;
                }
            }
            DepModel::Related { relation, field: f } => {
                let related = related_records(ctx, record, relation);
                for rel in related {
                    if is_dirty_computed(ctx, rel, f) {
                        resolve(ctx, pass, rel, f)?;
                    }
                }
            }
        }
    }

    let value = evaluate(ctx, record, field)?;

    let table = ctx.registry.table(record.model);
    let Some(attr) = table.field(field).attribute() else {
        return Ok(());
    };
    if !value.tag().satisfies(attr.ty) {
        return Err(ComputeError::BadValue {
            model: table.name.clone(),
            field: table.field_ident(field).to_string(),
            expected: attr.ty,
            got: value.tag(),
        });
    }

    metrics::with_state_mut(|m| m.recomputes = m.recomputes.saturating_add(1));

    let changed = {
        let Some(slot) = ctx.stores.store_mut(record.model).get_mut(record.slot) else {
            pass.stack.pop();
            return Ok(());
        };
        let changed = *slot.attr(field) != value;
        if changed {
            *slot.cell_mut(field) = FieldCell::Attr { value, dirty: false };
        } else {
            slot.set_dirty(field, false);
        }
        changed
    };

    pass.stack.pop();
    pass.computed.insert(key);

    if changed {
        ctx.log.record_field_changed(record, field);
        mark_dependents(ctx, record, field);
    }

    Ok(())
}

// Evaluate the field's compute: a registered function, or the built-in
// read-through for related aliases.
fn evaluate(
    ctx: &MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Result<Value, ComputeError> {
    let table = ctx.registry.table(record.model);
    let Some(compute) = table.field(field).attribute().and_then(|a| a.compute.as_ref()) else {
        return Ok(Value::None);
    };

    match &compute.kind {
        ComputeKind::Custom(func) => {
            let cctx = ComputeCtx::new(ctx.registry, &*ctx.stores, record);
            Ok(func(&cctx))
        }
        ComputeKind::Related {
            relation,
            field: remote,
        } => {
            let Some(slot) = ctx.stores.store(record.model).get(record.slot) else {
                return Ok(Value::None);
            };
            match slot.cell(*relation) {
                FieldCell::One(Some(target)) => {
                    let value = ctx
                        .stores
                        .store(target.model)
                        .get(target.slot)
                        .map_or(Value::None, |s| s.attr(*remote).clone());
                    Ok(value)
                }
                _ => Ok(Value::None),
            }
        }
    }
}

fn compute_model<'a>(
    ctx: &'a MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Option<&'a ComputeModel> {
    ctx.registry
        .table(record.model)
        .field(field)
        .attribute()
        .and_then(|a| a.compute.as_ref())
}

fn is_dirty_computed(ctx: &MutationCtx<'_>, record: Record, field: FieldId) -> bool {
    if compute_model(ctx, record, field).is_none() {
        return false;
    }
    ctx.stores
        .store(record.model)
        .get(record.slot)
        .is_some_and(|slot| slot.is_dirty(field))
}

fn related_records(ctx: &MutationCtx<'_>, record: Record, relation: FieldId) -> Vec<Record> {
    let Some(slot) = ctx.stores.store(record.model).get(record.slot) else {
        return Vec::new();
    };
    match slot.cell(relation) {
        FieldCell::One(Some(target)) => vec![*target],
        FieldCell::Many(members) => members.clone(),
        _ => Vec::new(),
    }
}
