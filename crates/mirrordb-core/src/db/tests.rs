use crate::{
    db::{Db, command::RelationCommand, compute::ComputeCtx, data::Data},
    error::Error,
    test_fixtures,
    value::Value,
};
use mirrordb_schema::{
    build::SchemaBuilder,
    node::{Field, Model},
    types::{AttributeType, ComputeMode},
};

use crate::db::{compute::ComputeError, executor::ExecutorError, store::StoreError};
use crate::model::RegistryError;

// ======================================================================
// Creation & defaults
// ======================================================================

#[test]
fn create_installs_defaults_and_runs_hooks() {
    let mut db = test_fixtures::db();
    let contact = db
        .create("contact", Data::new().set("id", 1u64))
        .expect("create should succeed");

    // default applied, will_create filled in the missing name
    assert_eq!(db.get(contact, "active").unwrap(), Value::Bool(true));
    assert_eq!(
        db.get(contact, "name").unwrap(),
        Value::Text("anonymous".to_string())
    );
    assert_eq!(test_fixtures::contacts_created(), 1);
}

#[test]
fn create_on_existing_identity_is_a_conflict() {
    let mut db = test_fixtures::db();
    db.create("contact", Data::new().set("id", 1u64)).unwrap();

    let err = db
        .create("contact", Data::new().set("id", 1u64))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ExecutorError(ExecutorError::RecordExists { .. })
    ));
}

#[test]
fn missing_identity_value_is_rejected() {
    let mut db = test_fixtures::db();
    let err = db
        .create("contact", Data::new().set("name", "ada"))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::StoreError(StoreError::MissingIdentity { .. })
    ));
}

#[test]
fn unknown_field_fails_fast() {
    let mut db = test_fixtures::db();
    let err = db
        .create("contact", Data::new().set("id", 1u64).set("nickname", "a"))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::StoreError(StoreError::UnknownField { .. })
    ));
}

#[test]
fn type_mismatch_fails_fast() {
    let mut db = test_fixtures::db();
    let err = db
        .create("contact", Data::new().set("id", 1u64).set("name", 5i64))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::StoreError(StoreError::TypeMismatch { .. })
    ));
}

#[test]
fn required_attribute_must_be_satisfied() {
    let schema = SchemaBuilder::new()
        .model(
            Model::new("note")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(Field::attribute("body", AttributeType::Text).required()),
        )
        .build()
        .expect("schema should build");
    let mut db = Db::builder(schema).build().expect("db should build");

    let err = db.create("note", Data::new().set("id", 1u64)).unwrap_err();
    assert!(matches!(
        err,
        Error::ExecutorError(ExecutorError::RequiredViolation { .. })
    ));

    let note = db
        .create("note", Data::new().set("id", 2u64).set("body", "hi"))
        .expect("satisfied required field should create");
    assert_eq!(db.get(note, "body").unwrap(), Value::Text("hi".to_string()));
}

// ======================================================================
// Update rules
// ======================================================================

#[test]
fn computed_fields_are_readonly() {
    let mut db = test_fixtures::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();

    let err = db
        .update(contact, Data::new().set("display_name", "nope"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ExecutorError(ExecutorError::ReadonlyViolation { .. })
    ));
}

#[test]
fn identifying_fields_are_immutable() {
    let mut db = test_fixtures::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();

    // writing the same value back is a no-op
    db.update(contact, Data::new().set("id", 1u64))
        .expect("idempotent identity write should pass");

    let err = db.update(contact, Data::new().set("id", 2u64)).unwrap_err();
    assert!(matches!(
        err,
        Error::ExecutorError(ExecutorError::IdentityViolation { .. })
    ));
}

#[test]
fn update_after_delete_raises_stale() {
    let mut db = test_fixtures::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();
    db.delete(contact).unwrap();

    assert!(!db.exists(contact));
    let err = db
        .update(contact, Data::new().set("name", "ghost"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::StoreError(StoreError::StaleRecord { .. })
    ));
    assert_eq!(test_fixtures::contacts_deleted(), 1);
}

// ======================================================================
// Compute scheduling
// ======================================================================

#[test]
fn eager_compute_runs_exactly_once_per_call() {
    let mut db = test_fixtures::db();
    let contact = db
        .create(
            "contact",
            Data::new().set("id", 1u64).set("name", "ada").set("email", "a@x"),
        )
        .unwrap();
    assert_eq!(test_fixtures::display_name_runs(), 1);

    db.update(contact, Data::new().set("name", "grace")).unwrap();
    assert_eq!(test_fixtures::display_name_runs(), 2);
    assert_eq!(
        db.get(contact, "display_name").unwrap(),
        Value::Text("grace <a@x>".to_string())
    );
    // the read did not recompute again
    assert_eq!(test_fixtures::display_name_runs(), 2);
}

#[test]
fn lazy_compute_defers_to_first_read() {
    let mut db = test_fixtures::db();
    let contact = db
        .create("contact", Data::new().set("id", 1u64).set("name", "ada"))
        .unwrap();
    let task = db
        .create(
            "task",
            Data::new()
                .set("id", 1u64)
                .set("title", "refactor")
                .apply("responsible", [RelationCommand::Link(contact)]),
        )
        .unwrap();
    assert_eq!(test_fixtures::summary_runs(), 0);

    assert_eq!(
        db.get(task, "summary").unwrap(),
        Value::Text("refactor (ada)".to_string())
    );
    assert_eq!(test_fixtures::summary_runs(), 1);

    // clean value, no recompute on a second read
    let _ = db.get(task, "summary").unwrap();
    assert_eq!(test_fixtures::summary_runs(), 1);

    // a write on the related record re-dirties through the inverse slot
    db.update(contact, Data::new().set("name", "grace")).unwrap();
    assert_eq!(test_fixtures::summary_runs(), 1);
    assert_eq!(
        db.get(task, "summary").unwrap(),
        Value::Text("refactor (grace)".to_string())
    );
    assert_eq!(test_fixtures::summary_runs(), 2);
}

#[test]
fn recompute_cycle_is_detected_and_fatal() {
    fn ping(ctx: &ComputeCtx<'_>) -> Value {
        Value::Int(ctx.value("pong").as_int().unwrap_or(0) + 1)
    }
    fn pong(ctx: &ComputeCtx<'_>) -> Value {
        Value::Int(ctx.value("ping").as_int().unwrap_or(0) + 1)
    }

    let schema = SchemaBuilder::new()
        .model(
            Model::new("node")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required())
                .field(
                    Field::attribute("ping", AttributeType::Int)
                        .compute(ComputeMode::Eager, ["pong".into()]),
                )
                .field(
                    Field::attribute("pong", AttributeType::Int)
                        .compute(ComputeMode::Eager, ["ping".into()]),
                ),
        )
        .build()
        .expect("schema should build");
    let mut db = Db::builder(schema)
        .compute("node", "ping", ping)
        .compute("node", "pong", pong)
        .build()
        .expect("db should build");

    let err = db.create("node", Data::new().set("id", 1u64)).unwrap_err();
    assert!(matches!(
        err,
        Error::ComputeError(ComputeError::Cycle { .. })
    ));
    assert!(err.is_programmer_error());
}

// ======================================================================
// Registry wiring
// ======================================================================

#[test]
fn missing_compute_function_fails_the_build() {
    let err = Db::builder(test_fixtures::schema()).build().unwrap_err();
    assert!(matches!(
        err,
        Error::RegistryError(RegistryError::MissingComputeFn { .. })
    ));
}

#[test]
fn unknown_compute_registration_fails_the_build() {
    fn noop(_: &ComputeCtx<'_>) -> Value {
        Value::None
    }

    let schema = SchemaBuilder::new()
        .model(
            Model::new("note")
                .identifying(["id"])
                .field(Field::attribute("id", AttributeType::Uint).required()),
        )
        .build()
        .expect("schema should build");
    let err = Db::builder(schema)
        .compute("note", "id", noop)
        .build()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RegistryError(RegistryError::UnknownComputeRegistration { .. })
    ));
}

// ======================================================================
// Lookup
// ======================================================================

#[test]
fn find_by_identity_resolves_without_creating() {
    let mut db = test_fixtures::db();
    assert!(
        db.find_by_identity("contact", &Data::new().set("id", 1u64))
            .unwrap()
            .is_none()
    );

    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();
    assert_eq!(
        db.find_by_identity("contact", &Data::new().set("id", 1u64))
            .unwrap(),
        Some(contact)
    );
    assert_eq!(db.len("contact").unwrap(), 1);
}

#[test]
fn clear_resets_every_store() {
    let mut db = test_fixtures::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();
    db.create("task", Data::new().set("id", 1u64)).unwrap();

    db.clear();
    assert!(!db.exists(contact));
    assert_eq!(db.len("contact").unwrap(), 0);
    assert_eq!(db.len("task").unwrap(), 0);
}
