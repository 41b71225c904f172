use super::*;
use crate::test_fixtures::{CUSTOMER, register_models};

#[test]
fn id_aliases_the_identifier_attribute() {
    let attr = CUSTOMER.attribute("id").unwrap();

    assert_eq!(attr.name, "id");
    assert_eq!(attr.kind, AttributeKind::Scalar(ScalarKind::Int64));
}

#[test]
fn relation_paths_are_computed_once_per_type() {
    let first = relation_paths(&CUSTOMER);
    let second = relation_paths(&CUSTOMER);

    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.element_collections.contains("tags"));
    assert!(first.to_many.contains("tags"));
    assert!(first.to_many.contains("orders"));
    assert!(first.to_one.contains("profile"));
    assert!(!first.to_many.contains("name"));
}

#[test]
fn enum_resolution_is_case_insensitive() {
    let model = &crate::test_fixtures::STATUS;

    assert_eq!(model.resolve("active"), Some("ACTIVE"));
    assert_eq!(model.resolve("Inactive"), Some("INACTIVE"));
    assert_eq!(model.resolve("unknown"), None);
    assert_eq!(model.ordinal("INACTIVE"), Some(1));
}

#[test]
fn to_many_detection_walks_the_relation_graph() {
    register_models();

    assert!(is_to_many_path(&CUSTOMER, "tags"));
    assert!(is_to_many_path(&CUSTOMER, "orders.name"));
    assert!(is_to_many_path(&CUSTOMER, "@tags"));
    assert!(!is_to_many_path(&CUSTOMER, "name"));
    assert!(!is_to_many_path(&CUSTOMER, "profile.city"));
    assert!(!is_to_many_path(&CUSTOMER, "missing"));
}

#[test]
fn registry_lookup_is_idempotent() {
    register_models();
    register_models();

    let model = lookup_model(CUSTOMER.path).unwrap();
    assert_eq!(model.entity_name, "Customer");
}
