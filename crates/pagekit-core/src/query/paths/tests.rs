use super::*;
use crate::model::ScalarKind;
use crate::test_fixtures::{CUSTOMER, register_models};
use std::sync::Arc;

fn resolver() -> PathResolver {
    register_models();
    PathResolver::new(&CUSTOMER)
}

#[test]
fn resolution_is_identity_stable() {
    let mut paths = resolver();

    let first = paths.get("name").unwrap();
    let second = paths.get("name").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.kind, AttributeKind::Scalar(ScalarKind::Text));
    assert_eq!(first.join, None);
}

#[test]
fn id_resolves_to_the_identifier() {
    let mut paths = resolver();

    let id = paths.get("id").unwrap();
    assert_eq!(id.kind, AttributeKind::Scalar(ScalarKind::Int64));
}

#[test]
fn dotted_paths_join_through_relations() {
    let mut paths = resolver();

    let city = paths.get("profile.city").unwrap();
    assert_eq!(city.join.as_deref(), Some("profile"));
    assert_eq!(city.kind, AttributeKind::Scalar(ScalarKind::Text));
}

#[test]
fn fields_sharing_a_relation_prefix_share_the_join() {
    let mut paths = resolver();

    paths.get("orders.name").unwrap();
    let first = paths.join("orders").cloned().unwrap();

    paths.get("orders.quantity").unwrap();
    let second = paths.join("orders").cloned().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn element_collections_use_the_canonical_at_alias() {
    let mut paths = resolver();

    let tags = paths.get("tags").unwrap();
    assert_eq!(tags.join.as_deref(), Some("@tags"));

    let join = paths.element_join("tags").unwrap();
    let again = paths.element_join("tags").unwrap();
    assert!(Arc::ptr_eq(&join, &again));
}

#[test]
fn explicit_joins_do_not_pollute_the_reuse_map() {
    let mut paths = resolver();

    let explicit = paths.get("@orders.name").unwrap();
    assert_eq!(explicit.field, "orders.name");
    assert!(paths.join("orders").is_none());

    // A later implicit resolution builds its own reusable join.
    paths.get("orders.name").unwrap();
    assert!(paths.join("orders").is_some());
}

#[test]
fn unknown_fields_fail_deterministically() {
    let mut paths = resolver();

    let err = paths.get("nope").unwrap_err();
    assert!(matches!(err, PathError::UnknownField { .. }));

    let err = paths.get("orders.nope").unwrap_err();
    assert!(matches!(err, PathError::UnknownField { .. }));
}

#[test]
fn single_segment_misses_fall_back_through_to_one_relations() {
    let mut paths = resolver();

    // `city` is not a customer attribute; it resolves through `profile`.
    let city = paths.get("city").unwrap();
    assert_eq!(city.field, "profile.city");
    assert_eq!(city.join.as_deref(), Some("profile"));

    let again = paths.get("city").unwrap();
    assert!(Arc::ptr_eq(&city, &again));
}

#[test]
fn register_join_seeds_reusable_joins() {
    let mut paths = resolver();

    paths.register_join("orders").unwrap();
    let seeded = paths.join("orders").cloned().unwrap();

    paths.get("orders.name").unwrap();
    let reused = paths.join("orders").cloned().unwrap();

    assert!(Arc::ptr_eq(&seeded, &reused));
}
