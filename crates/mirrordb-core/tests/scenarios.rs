//! End-to-end flows over the fixture graph: singular relation swaps,
//! additive command sequences, and upsert-through-commands.

mod common;

use mirrordb_core::{db::command::RelationCommand, db::data::Data, value::Value};

#[test]
fn inserting_a_singular_relation_links_both_sides() {
    let mut db = common::db();
    let contact = db.create("contact", Data::new().set("id", 10u64)).unwrap();

    db.update(
        contact,
        Data::new().apply(
            "address",
            [RelationCommand::Insert(Data::new().set("id", 10u64))],
        ),
    )
    .unwrap();

    let address = db
        .find_by_identity("address", &Data::new().set("id", 10u64))
        .unwrap()
        .expect("address record should exist");
    assert_eq!(db.one(contact, "address").unwrap(), Some(address));
    assert_eq!(db.one(address, "contact").unwrap(), Some(contact));
}

#[test]
fn relinking_a_singular_relation_clears_the_old_inverse() {
    let mut db = common::db();
    let contact = db.create("contact", Data::new().set("id", 10u64)).unwrap();
    db.update(
        contact,
        Data::new().apply(
            "address",
            [RelationCommand::Insert(Data::new().set("id", 10u64))],
        ),
    )
    .unwrap();
    let old = db
        .find_by_identity("address", &Data::new().set("id", 10u64))
        .unwrap()
        .unwrap();

    db.update(
        contact,
        Data::new().apply(
            "address",
            [RelationCommand::Insert(Data::new().set("id", 20u64))],
        ),
    )
    .unwrap();

    let new = db
        .find_by_identity("address", &Data::new().set("id", 20u64))
        .unwrap()
        .unwrap();
    assert_eq!(db.one(contact, "address").unwrap(), Some(new));
    // the old address survives, its inverse cleared
    assert!(db.exists(old));
    assert_eq!(db.one(old, "contact").unwrap(), None);
}

#[test]
fn plural_commands_are_additive_and_ordered() {
    let mut db = common::db();
    let contact = db
        .create(
            "contact",
            Data::new().set("id", 10u64).apply(
                "tasks",
                [RelationCommand::Create(Data::new().set("id", 10u64))],
            ),
        )
        .unwrap();

    db.update(
        contact,
        Data::new().apply(
            "tasks",
            [RelationCommand::Insert(Data::new().set("id", 20u64))],
        ),
    )
    .unwrap();

    let tasks = db.many(contact, "tasks").unwrap();
    assert_eq!(tasks.len(), 2);
    let task10 = db
        .find_by_identity("task", &Data::new().set("id", 10u64))
        .unwrap()
        .unwrap();
    let task20 = db
        .find_by_identity("task", &Data::new().set("id", 20u64))
        .unwrap()
        .unwrap();
    assert_eq!(tasks, vec![task10, task20]);
    assert_eq!(db.one(task20, "responsible").unwrap(), Some(contact));
}

#[test]
fn inserting_an_already_linked_member_updates_in_place() {
    let mut db = common::db();
    let contact = db
        .create(
            "contact",
            Data::new().set("id", 10u64).apply(
                "tasks",
                [RelationCommand::Create(Data::new().set("id", 10u64))],
            ),
        )
        .unwrap();

    db.update(
        contact,
        Data::new().apply(
            "tasks",
            [RelationCommand::Insert(
                Data::new().set("id", 10u64).set("title", "updated"),
            )],
        ),
    )
    .unwrap();

    let tasks = db.many(contact, "tasks").unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        db.get(tasks[0], "title").unwrap(),
        Value::Text("updated".to_string())
    );
}

#[test]
fn replace_clears_then_links_in_given_order() {
    let mut db = common::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();
    let t1 = db.create("task", Data::new().set("id", 1u64)).unwrap();
    let t2 = db.create("task", Data::new().set("id", 2u64)).unwrap();
    let t3 = db.create("task", Data::new().set("id", 3u64)).unwrap();

    db.update(
        contact,
        Data::new().apply(
            "tasks",
            [RelationCommand::Replace(vec![t1, t2])],
        ),
    )
    .unwrap();
    assert_eq!(db.many(contact, "tasks").unwrap(), vec![t1, t2]);

    db.update(
        contact,
        Data::new().apply("tasks", [RelationCommand::Replace(vec![t3, t1])]),
    )
    .unwrap();
    assert_eq!(db.many(contact, "tasks").unwrap(), vec![t3, t1]);

    // the replaced-away member is unlinked, not deleted
    assert!(db.exists(t2));
    assert_eq!(db.one(t2, "responsible").unwrap(), None);
}

#[test]
fn command_sequences_apply_left_to_right() {
    let mut db = common::db();
    let contact = db.create("contact", Data::new().set("id", 1u64)).unwrap();
    let t1 = db.create("task", Data::new().set("id", 1u64)).unwrap();

    db.update(
        contact,
        Data::new().apply(
            "tasks",
            [
                RelationCommand::Link(t1),
                RelationCommand::Clear,
                RelationCommand::Insert(Data::new().set("id", 2u64)),
            ],
        ),
    )
    .unwrap();

    let tasks = db.many(contact, "tasks").unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        db.get(tasks[0], "id").unwrap(),
        Value::Uint(2)
    );
    assert_eq!(db.one(t1, "responsible").unwrap(), None);
}
