//! Shared fixture models for the integration suites: the mail-flavoured
//! graph from the unit fixtures, built through the public API only.
#![allow(dead_code)]

use mirrordb_core::{
    db::{Db, compute::ComputeCtx},
    value::Value,
};
use mirrordb_schema::{
    build::{Schema, SchemaBuilder},
    node::{Field, Model, ModelPatch},
    types::{AttributeType, ComputeMode, RelationArity},
};
use std::cell::Cell;

thread_local! {
    static DISPLAY_NAME_RUNS: Cell<u64> = const { Cell::new(0) };
}

pub fn reset_counters() {
    DISPLAY_NAME_RUNS.set(0);
}

pub fn display_name_runs() -> u64 {
    DISPLAY_NAME_RUNS.get()
}

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

pub fn schema() -> Schema {
    SchemaBuilder::new()
        .model(
            Model::new("contact")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("name", AttributeType::Text))
                .field(Field::attribute("city", AttributeType::Text).related("address", "city"))
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

pub fn db() -> Db {
    reset_counters();

    Db::builder(schema())
        .compute("contact", "display_name", compute_display_name)
        .build()
        .expect("fixture db should build")
}
