use crate::{
    db::{
        compute,
        executor::MutationCtx,
        store::{FieldCell, StoreError},
    },
    error::Error,
    model::{FieldId, ModelId},
    record::Record,
};
use mirrordb_schema::types::RelationArity;

///
/// RelInfo
/// Copied relation metadata for one field, so ops can mutate the stores
/// without holding a registry borrow.
///

#[derive(Clone, Copy, Debug)]
struct RelInfo {
    arity: RelationArity,
    target: ModelId,
    inverse: FieldId,
    causal: bool,
}

// Resolve relation metadata, failing when the field is not relational.
fn rel_info(ctx: &MutationCtx<'_>, model: ModelId, field: FieldId) -> Result<RelInfo, StoreError> {
    let table = ctx.registry.table(model);
    let rel = table
        .field(field)
        .relation()
        .ok_or_else(|| StoreError::NotARelation {
            model: table.name.clone(),
            field: table.field_ident(field).to_string(),
        })?;

    Ok(RelInfo {
        arity: rel.arity,
        target: rel.target,
        inverse: rel.inverse,
        causal: rel.causal,
    })
}

// True when both halves of the pair live in the same cell (a symmetric
// self-relation linked to the record itself).
fn is_self_cell(a: Record, field: FieldId, b: Record, inverse: FieldId) -> bool {
    a == b && field == inverse
}

/// Link `b` into `a`'s relational field, producing every complementary
/// mutation needed to keep the inverse side correct. Linking an
/// already-linked pair is a no-op; evicted previous targets of singular
/// slots are detached first. Targets removed through causal fields are
/// pushed onto `victims` for the caller to delete.
pub(crate) fn link(
    ctx: &mut MutationCtx<'_>,
    a: Record,
    field: FieldId,
    b: Record,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let rel = rel_info(ctx, a.model, field)?;
    check_target(ctx, rel, b)?;
    ensure_exists(ctx, a)?;
    ensure_exists(ctx, b)?;

    if rel.arity.is_singular() {
        let current = read_one(ctx, a, field)?;
        if current == Some(b) {
            return Ok(());
        }
        if let Some(previous) = current {
            remove_pair(ctx, a, field, previous, victims)?;
        }

        write_one(ctx, a, field, Some(b))?;
        touch(ctx, a, field);
        attach_inverse(ctx, rel, a, b, victims)?;
    } else {
        if read_many(ctx, a, field)?.contains(&b) {
            return Ok(());
        }

        push_many(ctx, a, field, b)?;
        touch(ctx, a, field);

        // A symmetric self-link shares one cell; one entry covers both sides.
        if is_self_cell(a, field, b, rel.inverse) {
            return Ok(());
        }
        attach_inverse(ctx, rel, a, b, victims)?;
    }

    Ok(())
}

/// Remove the `a`→`b` link symmetrically. Unlinking a pair that is not
/// linked is a no-op; the target record is never deleted here (causal
/// victims are returned to the caller).
pub(crate) fn unlink(
    ctx: &mut MutationCtx<'_>,
    a: Record,
    field: FieldId,
    b: Record,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let rel = rel_info(ctx, a.model, field)?;
    check_target(ctx, rel, b)?;
    ensure_exists(ctx, a)?;
    ensure_exists(ctx, b)?;

    let linked = if rel.arity.is_singular() {
        read_one(ctx, a, field)? == Some(b)
    } else {
        read_many(ctx, a, field)?.contains(&b)
    };
    if linked {
        remove_pair(ctx, a, field, b, victims)?;
    }

    Ok(())
}

/// Remove every link from the field.
pub(crate) fn clear_field(
    ctx: &mut MutationCtx<'_>,
    a: Record,
    field: FieldId,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let rel = rel_info(ctx, a.model, field)?;
    ensure_exists(ctx, a)?;

    if rel.arity.is_singular() {
        if let Some(target) = read_one(ctx, a, field)? {
            remove_pair(ctx, a, field, target, victims)?;
        }
    } else {
        for member in read_many(ctx, a, field)? {
            remove_pair(ctx, a, field, member, victims)?;
        }
    }

    Ok(())
}

/// Detach a record from every relation it participates in, ahead of its
/// deletion. Both sides of every relation have a field, so clearing the
/// record's own cells covers all incoming references too.
pub(crate) fn detach_all(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let relation_fields: Vec<FieldId> = {
        let table = ctx.registry.table(record.model);
        table
            .field_ids()
            .filter(|f| table.field(*f).relation().is_some())
            .collect()
    };

    for field in relation_fields {
        clear_field(ctx, record, field, victims)?;
    }

    Ok(())
}

// ======================================================================
// Pair maintenance
// ======================================================================

// Remove one existing pair from both sides and collect causal victims.
fn remove_pair(
    ctx: &mut MutationCtx<'_>,
    x: Record,
    field: FieldId,
    y: Record,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let rel = rel_info(ctx, x.model, field)?;

    if rel.arity.is_singular() {
        write_one(ctx, x, field, None)?;
    } else {
        remove_many(ctx, x, field, y)?;
    }
    touch(ctx, x, field);

    if !is_self_cell(x, field, y, rel.inverse) {
        let inverse_rel = rel_info(ctx, y.model, rel.inverse)?;
        if inverse_rel.arity.is_singular() {
            write_one(ctx, y, rel.inverse, None)?;
        } else {
            remove_many(ctx, y, rel.inverse, x)?;
        }
        touch(ctx, y, rel.inverse);

        if inverse_rel.causal {
            victims.push(x);
        }
    }

    if rel.causal {
        victims.push(y);
    }

    Ok(())
}

// Install `a` on the inverse side of a fresh a→b link, evicting whatever a
// singular inverse slot previously held.
fn attach_inverse(
    ctx: &mut MutationCtx<'_>,
    rel: RelInfo,
    a: Record,
    b: Record,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let inverse_rel = rel_info(ctx, b.model, rel.inverse)?;

    if inverse_rel.arity.is_singular() {
        if let Some(previous) = read_one(ctx, b, rel.inverse)? {
            if previous != a {
                remove_pair(ctx, b, rel.inverse, previous, victims)?;
            }
        }
        write_one(ctx, b, rel.inverse, Some(a))?;
    } else {
        if read_many(ctx, b, rel.inverse)?.contains(&a) {
            // The forward side was just written; a preexisting inverse entry
            // would mean the stores disagreed before this call.
            return Ok(());
        }
        push_many(ctx, b, rel.inverse, a)?;
    }
    touch(ctx, b, rel.inverse);

    Ok(())
}

// ======================================================================
// Cell access
// ======================================================================

fn model_name(ctx: &MutationCtx<'_>, model: ModelId) -> String {
    ctx.registry.table(model).name.clone()
}

fn ensure_exists(ctx: &MutationCtx<'_>, record: Record) -> Result<(), StoreError> {
    if ctx.stores.exists(record) {
        Ok(())
    } else {
        Err(StoreError::StaleRecord {
            model: model_name(ctx, record.model),
        })
    }
}

fn check_target(ctx: &MutationCtx<'_>, rel: RelInfo, b: Record) -> Result<(), StoreError> {
    if b.model == rel.target {
        Ok(())
    } else {
        Err(StoreError::ModelMismatch {
            expected: model_name(ctx, rel.target),
            got: model_name(ctx, b.model),
        })
    }
}

fn arity_mismatch(ctx: &MutationCtx<'_>, record: Record, field: FieldId, expected: &'static str, actual: &'static str) -> StoreError {
    let table = ctx.registry.table(record.model);
    StoreError::ArityMismatch {
        model: table.name.clone(),
        field: table.field_ident(field).to_string(),
        expected,
        actual,
    }
}

fn read_one(
    ctx: &MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Result<Option<Record>, StoreError> {
    let name = model_name(ctx, record.model);
    let slot = ctx.stores.slot(record, &name)?;
    slot.cell(field)
        .as_one()
        .copied()
        .ok_or_else(|| arity_mismatch(ctx, record, field, "singular", "plural"))
}

fn read_many(
    ctx: &MutationCtx<'_>,
    record: Record,
    field: FieldId,
) -> Result<Vec<Record>, StoreError> {
    let name = model_name(ctx, record.model);
    let slot = ctx.stores.slot(record, &name)?;
    slot.cell(field)
        .as_many()
        .cloned()
        .ok_or_else(|| arity_mismatch(ctx, record, field, "plural", "singular"))
}

fn write_one(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    field: FieldId,
    value: Option<Record>,
) -> Result<(), StoreError> {
    let name = model_name(ctx, record.model);
    let slot = ctx.stores.slot_mut(record, &name)?;
    *slot.cell_mut(field) = FieldCell::One(value);
    Ok(())
}

fn push_many(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    field: FieldId,
    member: Record,
) -> Result<(), StoreError> {
    let name = model_name(ctx, record.model);
    let slot = ctx.stores.slot_mut(record, &name)?;
    if let FieldCell::Many(members) = slot.cell_mut(field) {
        members.push(member);
    }
    Ok(())
}

fn remove_many(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    field: FieldId,
    member: Record,
) -> Result<(), StoreError> {
    let name = model_name(ctx, record.model);
    let slot = ctx.stores.slot_mut(record, &name)?;
    if let FieldCell::Many(members) = slot.cell_mut(field) {
        members.retain(|m| *m != member);
    }
    Ok(())
}

// Record one relation-slot change: change-event entry plus recompute
// propagation for dependents of the slot.
fn touch(ctx: &mut MutationCtx<'_>, record: Record, field: FieldId) {
    ctx.log.record_field_changed(record, field);
    compute::mark_dependents(ctx, record, field);
}
