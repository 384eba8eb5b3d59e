use crate::{
    db::{
        data::Data,
        executor::{MutationCtx, SaveMode, save},
        relation,
        store::StoreError,
    },
    error::Error,
    model::FieldId,
    record::Record,
};

///
/// RelationCommand
///
/// The command vocabulary for writing to relational fields. A sequence
/// applies left-to-right; on singular fields every command replaces the
/// previous link, on plural fields `Link`/`Create`/`Insert` are additive.
///

#[derive(Debug)]
pub enum RelationCommand {
    /// Create a brand-new target record, then link it.
    Create(Data),
    /// Upsert the target by identifying fields, then link it.
    Insert(Data),
    /// Link an already-existing record without altering its fields.
    Link(Record),
    /// Remove the link without deleting the record.
    Unlink(Record),
    /// Clear the field, then link each given record in order.
    Replace(Vec<Record>),
    /// Remove all links from the field.
    Clear,
}

/// Apply one ordered command sequence to a relational field. Nested
/// `Create`/`Insert` recurse through the save executor before linking.
pub(crate) fn apply(
    ctx: &mut MutationCtx<'_>,
    record: Record,
    field: FieldId,
    commands: Vec<RelationCommand>,
    victims: &mut Vec<Record>,
) -> Result<(), Error> {
    let target = {
        let table = ctx.registry.table(record.model);
        table
            .field(field)
            .relation()
            .ok_or_else(|| StoreError::NotARelation {
                model: table.name.clone(),
                field: table.field_ident(field).to_string(),
            })?
            .target
    };

    for command in commands {
        match command {
            RelationCommand::Create(data) => {
                let linked = save::save(ctx, SaveMode::Create, target, data, victims)?;
                relation::link(ctx, record, field, linked, victims)?;
            }
            RelationCommand::Insert(data) => {
                let linked = save::save(ctx, SaveMode::Insert, target, data, victims)?;
                relation::link(ctx, record, field, linked, victims)?;
            }
            RelationCommand::Link(linked) => {
                relation::link(ctx, record, field, linked, victims)?;
            }
            RelationCommand::Unlink(linked) => {
                relation::unlink(ctx, record, field, linked, victims)?;
            }
            RelationCommand::Replace(records) => {
                relation::clear_field(ctx, record, field, victims)?;
                for linked in records {
                    relation::link(ctx, record, field, linked, victims)?;
                }
            }
            RelationCommand::Clear => {
                relation::clear_field(ctx, record, field, victims)?;
            }
        }
    }

    Ok(())
}
