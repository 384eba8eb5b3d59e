use crate::{
    db::{
        compute,
        executor::MutationCtx,
        store::{FieldCell, StoreError},
    },
    error::Error,
    model::FieldId,
    record::Record,
    view::{FieldSnapshot, RecordView},
};
use std::collections::BTreeMap;

/// Build a resolved snapshot of one record. Reading forces the record's
/// dirty lazy fields (and their transitive lazy dependencies) clean first,
/// so the view never exposes a stale computed value.
pub(crate) fn snapshot(ctx: &mut MutationCtx<'_>, record: Record) -> Result<RecordView, Error> {
    let table = ctx.registry.table(record.model);
    if !ctx.stores.exists(record) {
        return Err(StoreError::StaleRecord {
            model: table.name.clone(),
        }
        .into());
    }

    let dirty_computed: Vec<FieldId> = {
        let slot = ctx.stores.slot(record, &table.name)?;
        table
            .field_ids()
            .filter(|f| table.field(*f).is_computed() && slot.is_dirty(*f))
            .collect()
    };
    for field in dirty_computed {
        compute::force(ctx, record, field)?;
    }

    let slot = ctx.stores.slot(record, &table.name)?;
    let mut fields = BTreeMap::new();
    for field in table.field_ids() {
        let snapshot = match slot.cell(field) {
            FieldCell::Attr { value, .. } => FieldSnapshot::Value(value.clone()),
            FieldCell::One(target) => FieldSnapshot::One(*target),
            FieldCell::Many(members) => FieldSnapshot::Many(members.clone()),
        };
        fields.insert(table.field_ident(field).to_string(), snapshot);
    }

    Ok(RecordView::new(record, table.name.clone(), fields))
}
