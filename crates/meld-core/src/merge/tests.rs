use crate::{
    obs,
    reader::DomainReader,
    test_fixtures::{self, ORDER, PERSON},
    value::{EntityValue, Value},
    view::JsonView,
};
use meld_schema::{
    node::{Entity, Property, PropertyKind},
    registry::SchemaBuilder,
    types::ScalarKind,
};
use proptest::prelude::*;
use serde_json::json;

fn reader() -> DomainReader {
    DomainReader::new(test_fixtures::registry())
}

fn person_value() -> Value {
    Value::Entity(test_fixtures::person())
}

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

#[test]
fn patch_overwrites_scalars_and_preserves_the_identifier() {
    let reader = reader();
    let mut target = person_value();

    let doc = json!({"name": "Bob", "tags": ["a", "b", "c"]});
    reader.merge_partial(&doc, &mut target).unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("name"), Some(&text("Bob")));
    assert_eq!(entity.get("tags"), Some(&Value::from_list(vec!["a", "b", "c"])));

    // untouched fields survive
    assert_eq!(entity.get("id"), Some(&Value::Uint(7)));
    assert_eq!(entity.get("nickname"), Some(&text("Ally")));
}

#[test]
fn patch_never_writes_read_only_fields() {
    let reader = reader();
    let mut target = person_value();

    reader
        .merge_partial(&json!({"slug": "renamed", "name": "Bob"}), &mut target)
        .unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("name"), Some(&text("Bob")));
    // read-only state keeps its live value
    assert_eq!(entity.get("slug"), Some(&text("alice")));
}

#[test]
fn empty_document_changes_nothing() {
    let reader = reader();
    let mut target = person_value();
    let before = target.clone();

    let outcome = reader.merge_partial(&json!({}), &mut target).unwrap();

    assert_eq!(target, before);
    assert!(outcome.consumed.is_empty());
}

#[test]
fn dotted_field_names_are_not_shadowed_by_nested_merges() {
    const DOC: &str = "notes::Doc";
    const SECTION: &str = "notes::Section";
    const BODY: &str = "notes::Body";

    let registry = SchemaBuilder::default()
        .entity(Entity::new(
            DOC,
            vec![
                Property::new("meta", PropertyKind::Entity { target: SECTION }),
                Property::scalar("meta.note", ScalarKind::Text),
            ],
        ))
        .entity(Entity::new(
            SECTION,
            vec![Property::new("note", PropertyKind::Entity { target: BODY })],
        ))
        .entity(Entity::new(
            BODY,
            vec![Property::scalar("text", ScalarKind::Text)],
        ))
        .build()
        .unwrap();
    let reader = DomainReader::new(registry);

    let mut target = Value::Entity(
        EntityValue::new(DOC)
            .with_field(
                "meta",
                EntityValue::new(SECTION)
                    .with_field("note", EntityValue::new(BODY).with_field("text", "inner")),
            )
            .with_field("meta.note", "outer"),
    );

    let outcome = reader
        .merge_partial(
            &json!({
                "meta": {"note": {"text": "revised inner"}},
                "meta.note": "revised outer",
            }),
            &mut target,
        )
        .unwrap();

    // the nested merge's record must not mask the dotted top-level field
    assert!(outcome.consumed.nested_paths().contains("meta.note"));
    assert!(!outcome.consumed.contains_field("meta.note"));

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("meta.note"), Some(&text("revised outer")));
    let body = entity
        .get("meta")
        .and_then(Value::as_entity)
        .and_then(|section| section.get("note"))
        .and_then(Value::as_entity)
        .unwrap();
    assert_eq!(body.get("text"), Some(&text("revised inner")));
}

#[test]
fn shorter_document_array_truncates_the_live_sequence() {
    let reader = reader();
    let mut target = person_value();

    reader.merge_partial(&json!({"tags": ["z"]}), &mut target).unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("tags"), Some(&Value::from_list(vec!["z"])));
}

#[test]
fn nested_entity_fields_merge_instead_of_replacing() {
    let reader = reader();
    let mut target = person_value();

    let outcome = reader
        .merge_partial(&json!({"address": {"street": "2 Oak Ave"}}), &mut target)
        .unwrap();

    let address = target
        .as_entity()
        .unwrap()
        .get("address")
        .and_then(Value::as_entity)
        .unwrap();
    assert_eq!(address.get("street"), Some(&text("2 Oak Ave")));
    // fields absent from the document keep their value
    assert_eq!(address.get("city"), Some(&text("Springfield")));

    assert!(outcome.consumed.contains("address"));
}

#[test]
fn map_entries_upsert_and_targets_only_keys_survive() {
    let reader = reader();
    let mut target = person_value();

    let outcome = reader
        .merge_partial(&json!({"scores": {"math": 95, "science": 80}}), &mut target)
        .unwrap();

    let expected = Value::from_map(vec![
        (text("art"), Value::Int(70)),
        (text("math"), Value::Int(95)),
        (text("science"), Value::Int(80)),
    ])
    .unwrap();
    assert_eq!(target.as_entity().unwrap().get("scores"), Some(&expected));
    assert!(outcome.consumed.contains("scores"));
}

#[test]
fn empty_map_object_wipes_the_live_map() {
    let reader = reader();
    let mut target = person_value();

    let outcome = reader
        .merge_partial(&json!({"scores": {}}), &mut target)
        .unwrap();

    assert_eq!(
        target.as_entity().unwrap().get("scores"),
        Some(&Value::Map(vec![]))
    );
    assert!(!outcome.consumed.contains("scores"));
}

#[test]
fn linkable_references_replace_wholesale() {
    let reader = reader();
    let mut target = person_value();
    target.as_entity_mut().unwrap().set(
        "partner",
        Value::Entity(
            EntityValue::new(PERSON)
                .with_field("id", 9_u64)
                .with_field("name", "Pat")
                .with_field("nickname", "P"),
        ),
    );

    let outcome = reader
        .merge_partial(&json!({"partner": {"id": 9, "name": "Eve"}}), &mut target)
        .unwrap();

    let partner = target
        .as_entity()
        .unwrap()
        .get("partner")
        .and_then(Value::as_entity)
        .unwrap();
    assert_eq!(partner.get("name"), Some(&text("Eve")));
    // wholesale replacement, not a field merge
    assert!(partner.get("nickname").is_none());
    assert!(!outcome.consumed.contains("partner"));
}

#[test]
fn unknown_document_fields_are_ignored() {
    let reader = reader();
    let mut target = person_value();
    let before = target.clone();

    reader
        .merge_partial(&json!({"bogus": 1, "also_bogus": {"x": true}}), &mut target)
        .unwrap();

    assert_eq!(target, before);
}

#[test]
fn unresolved_schema_degrades_to_a_loose_pass() {
    let reader = reader();
    let mut target = Value::Entity(EntityValue::new("no::Such").with_field("name", "Old"));

    let outcome = reader
        .merge_partial(&json!({"name": "New", "extra": true}), &mut target)
        .unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("name"), Some(&text("New")));
    assert_eq!(entity.get("extra"), Some(&Value::Bool(true)));
    assert!(outcome.consumed.is_empty());
}

#[test]
fn entities_inside_arrays_merge_positionally() {
    let reader = reader();
    let mut target = Value::Entity(
        EntityValue::new(ORDER)
            .with_field("id", 1_u64)
            .with_field("code", "A-1")
            .with_field(
                "lines",
                Value::from_list(vec![Value::Entity(test_fixtures::order_line(1, "sku-1", 2))]),
            ),
    );

    let outcome = reader
        .merge_partial(&json!({"lines": [{"quantity": 5}]}), &mut target)
        .unwrap();

    let lines = target.as_entity().unwrap().get("lines").unwrap();
    let line = lines.as_list().unwrap()[0].as_entity().unwrap();
    assert_eq!(line.get("quantity"), Some(&Value::Uint(5)));
    assert_eq!(line.get("sku"), Some(&text("sku-1")));

    assert!(outcome.consumed.contains("lines"));
}

#[test]
fn decode_failures_carry_the_field_path() {
    let reader = reader();
    let mut target = person_value();

    let err = reader
        .merge_partial(&json!({"address": {"street": 42}}), &mut target)
        .unwrap_err();

    assert_eq!(err.path(), Some("address.street"));
    assert!(err.is_payload_unreadable());
}

#[test]
fn malformed_payloads_fail_before_touching_the_target() {
    let reader = reader();
    let mut target = person_value();
    let before = target.clone();

    let err = reader.read_and_merge(b"{not json", &mut target).unwrap_err();

    assert!(err.is_payload_unreadable());
    assert_eq!(target, before);
}

#[test]
fn non_object_roots_are_rejected() {
    let reader = reader();
    let mut target = person_value();

    let err = reader.merge_partial(&json!([1, 2]), &mut target).unwrap_err();
    assert!(err.is_payload_unreadable());
}

#[test]
fn put_adopts_source_values_and_hidden_state_survives() {
    let registry = test_fixtures::registry();
    let view = JsonView::new(registry.clone()).hide(PERSON, "nickname");
    let reader = DomainReader::with_view(registry, view);

    let mut target = person_value();
    let source = Value::Entity(
        EntityValue::new(PERSON)
            .with_field("id", 7_u64)
            .with_field("name", "Carol"),
    );

    reader.merge_whole_object(&source, &mut target, false).unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("name"), Some(&text("Carol")));
    // hidden and absent on the source: the live value survives
    assert_eq!(entity.get("nickname"), Some(&text("Ally")));
    // identifier and version slots are never written
    assert_eq!(entity.get("id"), Some(&Value::Uint(7)));
    assert_eq!(entity.get("rev"), Some(&Value::Uint(1)));
}

#[test]
fn put_copies_hidden_state_present_on_the_source() {
    let registry = test_fixtures::registry();
    let view = JsonView::new(registry.clone()).hide(PERSON, "nickname");
    let reader = DomainReader::with_view(registry, view);

    let mut target = person_value();
    let source = Value::Entity(
        EntityValue::new(PERSON)
            .with_field("name", "Carol")
            .with_field("nickname", "Cee"),
    );

    reader.merge_whole_object(&source, &mut target, false).unwrap();

    assert_eq!(
        target.as_entity().unwrap().get("nickname"),
        Some(&text("Cee"))
    );
}

#[test]
fn put_map_key_set_follows_the_source() {
    let reader = reader();
    let mut target = person_value();

    let source = Value::Entity(EntityValue::new(PERSON).with_field(
        "scores",
        Value::from_map(vec![(text("math"), Value::Int(100))]).unwrap(),
    ));

    reader.merge_whole_object(&source, &mut target, false).unwrap();

    // target-only keys are dropped on PUT
    let expected = Value::from_map(vec![(text("math"), Value::Int(100))]).unwrap();
    assert_eq!(target.as_entity().unwrap().get("scores"), Some(&expected));
}

#[test]
fn put_never_writes_read_only_fields() {
    let reader = reader();
    let mut target = person_value();

    let source = Value::Entity(
        EntityValue::new(PERSON)
            .with_field("name", "Carol")
            .with_field("slug", "carol"),
    );
    reader.merge_whole_object(&source, &mut target, false).unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("name"), Some(&text("Carol")));
    assert_eq!(entity.get("slug"), Some(&text("alice")));
}

#[test]
fn put_collections_adopt_the_source_length() {
    let reader = reader();
    let mut target = person_value();

    // shorter source truncates the live sequence
    let source = Value::Entity(
        EntityValue::new(PERSON).with_field("tags", Value::from_list(vec!["a"])),
    );
    reader.merge_whole_object(&source, &mut target, false).unwrap();
    assert_eq!(
        target.as_entity().unwrap().get("tags"),
        Some(&Value::from_list(vec!["a"]))
    );

    // longer source extends it
    let source = Value::Entity(
        EntityValue::new(PERSON).with_field("tags", Value::from_list(vec!["a", "b", "c"])),
    );
    reader.merge_whole_object(&source, &mut target, false).unwrap();
    assert_eq!(
        target.as_entity().unwrap().get("tags"),
        Some(&Value::from_list(vec!["a", "b", "c"]))
    );
}

#[test]
fn put_identifier_mismatch_replaces_the_reference_without_contamination() {
    let reader = reader();

    let mut target = person_value();
    target.as_entity_mut().unwrap().set(
        "partner",
        Value::Entity(
            EntityValue::new(PERSON)
                .with_field("id", 9_u64)
                .with_field("name", "Pat")
                .with_field("nickname", "P"),
        ),
    );

    let source_partner = EntityValue::new(PERSON)
        .with_field("id", 8_u64)
        .with_field("name", "Eve");
    let source = Value::Entity(
        EntityValue::new(PERSON).with_field("partner", source_partner.clone()),
    );

    reader.merge_whole_object(&source, &mut target, false).unwrap();

    // different persisted entity: the new reference wins verbatim, no
    // field bleed-through from the old one
    assert_eq!(
        target.as_entity().unwrap().get("partner"),
        Some(&Value::Entity(source_partner))
    );
}

#[test]
fn put_does_not_traverse_bidirectional_inverses() {
    let reader = reader();

    let back_ref = EntityValue::new(ORDER)
        .with_field("id", 1_u64)
        .with_field("code", "A-1");
    let mut line = test_fixtures::order_line(1, "sku-1", 2);
    line.set("order", Value::Entity(back_ref.clone()));

    let mut target = Value::Entity(
        EntityValue::new(ORDER)
            .with_field("id", 1_u64)
            .with_field("code", "A-1")
            .with_field("lines", Value::from_list(vec![Value::Entity(line)])),
    );

    let mut source_line = test_fixtures::order_line(1, "sku-1", 5);
    source_line.set(
        "order",
        Value::Entity(
            EntityValue::new(ORDER)
                .with_field("id", 2_u64)
                .with_field("code", "B-2"),
        ),
    );
    let source = Value::Entity(
        EntityValue::new(ORDER)
            .with_field("code", "A-2")
            .with_field("lines", Value::from_list(vec![Value::Entity(source_line)])),
    );

    reader.merge_whole_object(&source, &mut target, false).unwrap();

    let entity = target.as_entity().unwrap();
    assert_eq!(entity.get("code"), Some(&text("A-2")));

    let line = entity.get("lines").unwrap().as_list().unwrap()[0]
        .as_entity()
        .unwrap();
    assert_eq!(line.get("quantity"), Some(&Value::Uint(5)));
    // the inverse side keeps its original back reference
    assert_eq!(line.get("order"), Some(&Value::Entity(back_ref)));
}

#[test]
fn patch_and_put_record_counters() {
    obs::merge_reset_all();

    let reader = reader();
    let mut target = person_value();
    reader
        .merge_partial(&json!({"name": "Bob", "address": {"city": "Shelbyville"}}), &mut target)
        .unwrap();
    reader
        .merge_whole_object(&target.clone(), &mut target, false)
        .unwrap();

    let report = obs::merge_report();
    assert_eq!(report.ops.patch_calls, 1);
    assert_eq!(report.ops.put_calls, 1);
    assert_eq!(report.entities[PERSON].patch_calls, 1);
    assert_eq!(report.entities[PERSON].fields_consumed, 1);
}

proptest! {
    #[test]
    fn patch_is_idempotent(
        name in "[a-z]{1,8}",
        tags in proptest::collection::vec("[a-z]{1,4}", 0..4),
    ) {
        let reader = DomainReader::new(test_fixtures::registry());
        let doc = json!({"name": name, "tags": tags});

        let mut once = Value::Entity(test_fixtures::person());
        reader.merge_partial(&doc, &mut once).unwrap();

        let mut twice = once.clone();
        reader.merge_partial(&doc, &mut twice).unwrap();

        prop_assert_eq!(once, twice);
    }
}
