use crate::{
    MAX_CASCADE_RECORDS,
    db::{
        executor::{ExecutorError, MutationCtx, load},
        relation,
        store::StoreError,
    },
    error::Error,
    record::Record,
};

/// Delete one record: `will_delete` hook, full detach from every relation,
/// then slot free. Targets unlinked through causal fields cascade into the
/// same worklist. Deleting through a stale handle is an error.
pub(crate) fn delete(ctx: &mut MutationCtx<'_>, record: Record) -> Result<(), Error> {
    if !ctx.stores.exists(record) {
        return Err(StoreError::StaleRecord {
            model: ctx.registry.table(record.model).name.clone(),
        }
        .into());
    }

    delete_worklist(ctx, vec![record])
}

/// Delete causal victims collected during relation maintenance. Victims
/// already gone (deleted earlier in the same call) are skipped silently.
pub(crate) fn process_victims(
    ctx: &mut MutationCtx<'_>,
    victims: Vec<Record>,
) -> Result<(), Error> {
    if victims.is_empty() {
        return Ok(());
    }

    delete_worklist(ctx, victims)
}

// Iterative cascade; a worklist instead of recursion keeps deep causal
// chains off the call stack and makes the overflow guard exact.
fn delete_worklist(ctx: &mut MutationCtx<'_>, mut work: Vec<Record>) -> Result<(), Error> {
    let mut deleted = 0usize;

    while let Some(record) = work.pop() {
        if !ctx.stores.exists(record) {
            continue;
        }

        deleted += 1;
        if deleted > MAX_CASCADE_RECORDS {
            return Err(ExecutorError::CascadeOverflow {
                limit: MAX_CASCADE_RECORDS,
            }
            .into());
        }

        if let Some(hook) = ctx.registry.table(record.model).hooks.will_delete {
            let view = load::snapshot(ctx, record)?;
            hook(&view);
        }

        let mut victims = Vec::new();
        relation::detach_all(ctx, record, &mut victims)?;

        ctx.stores.store_mut(record.model).remove(record.slot);
        ctx.log.record_deleted(record);

        work.extend(victims);
    }

    Ok(())
}
