//! Registry construction and shape-flattening tests over a small
//! hand-written schema snapshot.

use sigil_catalog::{merge_object_types, Error, SchemaRegistry};
use sigil_schema::{Cardinality, SchemaVersion, TypeId, TypeRecord};
use uuid::Uuid;

fn tid(n: u128) -> TypeId {
    Uuid::from_u128(n)
}

const STR: u128 = 0x101;
const INT64: u128 = 0x102;
const BASE_CONTENT: u128 = 0x201;
const POST: u128 = 0x202;
const USER: u128 = 0x203;

/// std::str, std::int64, an abstract Content base with a `title: One` and
/// `author: AtMostOne` pointer, and a Post that overrides `title` as
/// AtMostOne and adds its own `votes`.
fn snapshot() -> Vec<TypeRecord> {
    serde_json::from_value(serde_json::json!([
        {"kind": "scalar", "id": tid(STR), "name": "std::str"},
        {"kind": "scalar", "id": tid(INT64), "name": "std::int64"},
        {
            "kind": "object",
            "id": tid(BASE_CONTENT),
            "name": "default::Content",
            "is_abstract": true,
            "pointers": [
                {"name": "title", "kind": "property", "real_cardinality": "One",
                 "target_id": tid(STR)},
                {"name": "author", "kind": "link", "real_cardinality": "AtMostOne",
                 "target_id": tid(USER)}
            ]
        },
        {
            "kind": "object",
            "id": tid(POST),
            "name": "default::Post",
            "bases": [{"id": tid(BASE_CONTENT), "name": "default::Content"}],
            "pointers": [
                {"name": "title", "kind": "property", "real_cardinality": "AtMostOne",
                 "target_id": tid(STR)},
                {"name": "votes", "kind": "property", "real_cardinality": "Many",
                 "target_id": tid(INT64)}
            ],
            "backlinks": [
                {"name": "<liked_by[is default::User]", "real_cardinality": "Many",
                 "target_id": tid(USER)}
            ],
            "backlink_stubs": [
                {"name": "<liked_by", "real_cardinality": "Many",
                 "target_id": tid(USER), "stub": "liked_by"}
            ]
        },
        {
            "kind": "object",
            "id": tid(USER),
            "name": "default::User",
            "pointers": [
                {"name": "name", "kind": "property", "real_cardinality": "One",
                 "target_id": tid(STR), "is_exclusive": true}
            ]
        }
    ]))
    .expect("fixture must deserialize")
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::from_introspection(snapshot(), &[], Vec::new(), SchemaVersion::new(3, 0))
        .expect("registry must build")
}

#[test]
fn resolves_by_id_and_name() {
    let registry = registry();
    let by_id = registry.resolve(tid(POST)).unwrap();
    let by_name = registry.resolve_by_name("default::Post").unwrap();
    // canonical instance: same Arc both ways
    assert!(std::sync::Arc::ptr_eq(by_id, by_name));
}

#[test]
fn unresolved_id_is_an_error() {
    let registry = registry();
    match registry.resolve(tid(0xdead)) {
        Err(Error::UnresolvedType(id)) => assert_eq!(id, tid(0xdead)),
        other => panic!("expected UnresolvedType, got {other:?}"),
    }
}

#[test]
fn derived_declaration_shadows_ancestor() {
    let registry = registry();
    let post = registry.resolve(tid(POST)).unwrap();
    let shape = post.as_object().unwrap().pointers(&registry).unwrap();

    // exactly one `title`, with the derived cardinality
    let title = shape.get("title").expect("title must be in shape");
    assert_eq!(title.cardinality, Cardinality::AtMostOne);

    // inherited pointer comes through untouched
    let author = shape.get("author").expect("author must be inherited");
    assert_eq!(author.cardinality, Cardinality::AtMostOne);
    assert!(author.is_link());
}

#[test]
fn own_pointers_precede_inherited_and_include_backlinks() {
    let registry = registry();
    let post = registry.resolve(tid(POST)).unwrap();
    let shape = post.as_object().unwrap().pointers(&registry).unwrap();

    let names: Vec<&str> = shape.iter().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        vec![
            "title",
            "votes",
            "<liked_by[is default::User]",
            "<liked_by",
            "author",
        ]
    );

    // backlinks are never writable
    let backlink = shape.get("<liked_by").unwrap();
    assert!(!backlink.is_writable);
}

#[test]
fn shape_is_computed_once() {
    let registry = registry();
    let post = registry.resolve(tid(POST)).unwrap();
    let object = post.as_object().unwrap();

    let first = object.pointers(&registry).unwrap() as *const _;
    let second = object.pointers(&registry).unwrap() as *const _;
    assert_eq!(first, second);
}

#[test]
fn non_object_base_is_fatal() {
    let mut types = snapshot();
    // repoint Post's base at a scalar
    if let TypeRecord::Object { bases, .. } = types
        .iter_mut()
        .find(|t| t.name() == "default::Post")
        .unwrap()
    {
        bases[0].id = tid(STR);
    }
    let registry =
        SchemaRegistry::from_introspection(types, &[], Vec::new(), SchemaVersion::new(3, 0))
            .unwrap();

    let post = registry.resolve(tid(POST)).unwrap();
    match post.as_object().unwrap().pointers(&registry) {
        Err(Error::InvalidBaseType { name }) => assert_eq!(name, "std::str"),
        other => panic!("expected InvalidBaseType, got {other:?}"),
    }
}

#[test]
fn duplicate_type_name_is_rejected() {
    let mut types = snapshot();
    types.push(serde_json::from_value(serde_json::json!(
        {"kind": "scalar", "id": tid(0x999), "name": "std::str"}
    )).unwrap());

    match SchemaRegistry::from_introspection(types, &[], Vec::new(), SchemaVersion::new(3, 0)) {
        Err(Error::DuplicateTypeName(name)) => assert_eq!(name, "std::str"),
        other => panic!("expected DuplicateTypeName, got {other:?}"),
    }
}

#[test]
fn merged_union_type_synthesizes_name() {
    let registry = registry();
    let post = registry.resolve(tid(POST)).unwrap();
    let user = registry.resolve(tid(USER)).unwrap();

    let merged = merge_object_types(
        &registry,
        post.as_object().unwrap(),
        user.as_object().unwrap(),
    )
    .unwrap();

    assert_eq!(merged.name(), "default::Post UNION default::User");
    // Post and User share no pointer with identical cardinality+target
    assert!(merged
        .as_object()
        .unwrap()
        .prebuilt_shape()
        .unwrap()
        .is_empty());
}

#[test]
fn globals_are_version_gated() {
    let globals: Vec<sigil_schema::GlobalRecord> = serde_json::from_value(serde_json::json!([
        {"id": Uuid::from_u128(0x900), "name": "default::current_user_id",
         "target_id": tid(STR), "real_cardinality": "AtMostOne"}
    ]))
    .unwrap();

    let modern = SchemaRegistry::from_introspection(
        snapshot(),
        &[],
        globals.clone(),
        SchemaVersion::new(2, 0),
    )
    .unwrap();
    let global = modern.global("default::current_user_id").unwrap();
    assert_eq!(global.cardinality, Cardinality::AtMostOne);

    match modern.global("default::missing") {
        Err(Error::UnknownGlobal(name)) => assert_eq!(name, "default::missing"),
        other => panic!("expected UnknownGlobal, got {other:?}"),
    }

    let legacy =
        SchemaRegistry::from_introspection(snapshot(), &[], globals, SchemaVersion::new(1, 4))
            .unwrap();
    assert!(matches!(
        legacy.global("default::current_user_id"),
        Err(Error::UnsupportedSchemaVersion { .. })
    ));
}
