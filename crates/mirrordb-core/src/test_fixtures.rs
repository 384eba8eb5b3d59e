//! Fixture models for unit tests: a small mail-flavoured graph (contacts,
//! addresses, tasks, tags, messages with causal attachments) exercising
//! every relation arity, patches, computes, related aliases, and hooks.

use crate::{
    db::{Db, compute::ComputeCtx},
    model::{Draft, Hooks},
    value::Value,
    view::RecordView,
};
use mirrordb_schema::{
    build::{Schema, SchemaBuilder},
    node::{Field, Model, ModelPatch},
    types::{AttributeType, ComputeMode, RelationArity},
};
use std::cell::Cell;

thread_local! {
    static DISPLAY_NAME_RUNS: Cell<u64> = const { Cell::new(0) };
    static SUMMARY_RUNS: Cell<u64> = const { Cell::new(0) };
    static CONTACTS_CREATED: Cell<u64> = const { Cell::new(0) };
    static CONTACTS_DELETED: Cell<u64> = const { Cell::new(0) };
}

pub(crate) fn reset_counters() {
    DISPLAY_NAME_RUNS.set(0);
    SUMMARY_RUNS.set(0);
    CONTACTS_CREATED.set(0);
    CONTACTS_DELETED.set(0);
}

pub(crate) fn display_name_runs() -> u64 {
    DISPLAY_NAME_RUNS.get()
}

pub(crate) fn summary_runs() -> u64 {
    SUMMARY_RUNS.get()
}

pub(crate) fn contacts_created() -> u64 {
    CONTACTS_CREATED.get()
}

pub(crate) fn contacts_deleted() -> u64 {
    CONTACTS_DELETED.get()
}

// "name <email>" when both set, otherwise the bare name.
fn compute_display_name(ctx: &ComputeCtx<'_>) -> Value {
    DISPLAY_NAME_RUNS.set(DISPLAY_NAME_RUNS.get() + 1);

    let name = ctx.value("name");
    let email = ctx.value("email");
    match (name.as_text(), email.as_text()) {
        (Some(name), Some(email)) => Value::Text(format!("{name} <{email}>")),
        (Some(name), None) => Value::Text(name.to_string()),
        _ => Value::None,
    }
}

// "title (responsible name)" across a relation hop.
fn compute_summary(ctx: &ComputeCtx<'_>) -> Value {
    SUMMARY_RUNS.set(SUMMARY_RUNS.get() + 1);

    let title = ctx.value("title");
    let Some(title) = title.as_text() else {
        return Value::None;
    };
    let responsible = ctx
        .one("responsible")
        .map(|contact| ctx.value_of(contact, "name"));
    match responsible.as_ref().and_then(|v| v.as_text()) {
        Some(name) => Value::Text(format!("{title} ({name})")),
        None => Value::Text(title.to_string()),
    }
}

fn contact_will_create(draft: &mut Draft<'_>) {
    if draft.get("name").is_ok_and(|v| v.is_none()) {
        draft
            .set("name", "anonymous")
            .expect("contact draft accepts name");
    }
}

fn contact_created(_view: &RecordView) {
    CONTACTS_CREATED.set(CONTACTS_CREATED.get() + 1);
}

fn contact_will_delete(_view: &RecordView) {
    CONTACTS_DELETED.set(CONTACTS_DELETED.get() + 1);
}

/// The fixture schema. The `email`/`display_name` pair arrives via a patch,
/// the way an optional module would contribute it.
pub(crate) fn schema() -> Schema {
    SchemaBuilder::new()
        .model(
            Model::new("contact")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("name", AttributeType::Text))
                .field(Field::attribute("active", AttributeType::Bool).default_value(true))
                .field(
                    Field::attribute("city", AttributeType::Text).related("address", "city"),
                )
                .field(Field::relation(
                    "address",
                    RelationArity::OneToOne,
                    "address",
                    "contact",
                ))
                .field(Field::relation(
                    "tasks",
                    RelationArity::OneToMany,
                    "task",
                    "responsible",
                ))
                .field(Field::relation(
                    "tags",
                    RelationArity::ManyToMany,
                    "tag",
                    "contacts",
                )),
        )
        .patch(
            ModelPatch::new("contact")
                .field(Field::attribute("email", AttributeType::Text))
                .field(Field::attribute("display_name", AttributeType::Text).compute(
                    ComputeMode::Eager,
                    ["name".into(), "email".into()],
                )),
        )
        .model(
            Model::new("address")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("city", AttributeType::Text))
                .field(Field::attribute("street", AttributeType::Text))
                .field(Field::relation(
                    "contact",
                    RelationArity::OneToOne,
                    "contact",
                    "address",
                )),
        )
        .model(
            Model::new("task")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("title", AttributeType::Text))
                .field(Field::attribute("done", AttributeType::Bool).default_value(false))
                .field(Field::attribute("summary", AttributeType::Text).compute(
                    ComputeMode::Lazy,
                    ["title".into(), "responsible.name".into()],
                ))
                .field(Field::relation(
                    "responsible",
                    RelationArity::ManyToOne,
                    "contact",
                    "tasks",
                )),
        )
        .model(
            Model::new("tag")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("name", AttributeType::Text))
                .field(Field::relation(
                    "contacts",
                    RelationArity::ManyToMany,
                    "contact",
                    "tags",
                )),
        )
        .model(
            Model::new("message")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("body", AttributeType::Text))
                .field(
                    Field::relation(
                        "attachments",
                        RelationArity::OneToMany,
                        "attachment",
                        "message",
                    )
                    .causal(),
                ),
        )
        .model(
            Model::new("attachment")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("name", AttributeType::Text))
                .field(Field::relation(
                    "message",
                    RelationArity::ManyToOne,
                    "message",
                    "attachments",
                )),
        )
        .build()
        .expect("fixture schema should build")
}

/// A fresh Db over the fixture schema, computes and hooks wired.
pub(crate) fn db() -> Db {
    reset_counters();

    Db::builder(schema())
        .compute("contact", "display_name", compute_display_name)
        .compute("task", "summary", compute_summary)
        .hooks(
            "contact",
            Hooks {
                will_create: Some(contact_will_create),
                created: Some(contact_created),
                will_delete: Some(contact_will_delete),
            },
        )
        .build()
        .expect("fixture db should build")
}
