use super::*;
use crate::query::criteria::{Criteria, IgnoreCase, Like};

fn sample() -> PageRequest {
    PageRequest::new()
        .offset(20)
        .limit(10)
        .order_by("id")
        .order_by_desc("name")
        .filter("name", Criteria::Like(Like::contains("05")))
        .filter("tier", Value::Enum("FOO".into()))
        .filter_any("code", Criteria::IgnoreCase(IgnoreCase::new("XYZ")))
}

#[test]
fn canonical_form_is_stable_and_sorted() {
    let canonical = sample().canonical();

    assert_eq!(
        canonical,
        "page{offset=20, limit=10, order=[id asc, name desc], \
         required={name=contains(05), tier=FOO}, optional={code=ignore_case(XYZ)}}"
    );
}

#[test]
fn canonical_form_ignores_criteria_insertion_order() {
    let forward = PageRequest::new()
        .filter("a", 1i64)
        .filter("b", 2i64)
        .canonical();
    let backward = PageRequest::new()
        .filter("b", 2i64)
        .filter("a", 1i64)
        .canonical();

    assert_eq!(forward, backward);
}

#[test]
fn canonical_form_keeps_ordering_sequence_order() {
    let ab = PageRequest::new().order_by("a").order_by("b").canonical();
    let ba = PageRequest::new().order_by("b").order_by("a").canonical();

    assert_ne!(ab, ba);
}

#[test]
fn unbounded_limit_renders_as_a_star() {
    let canonical = PageRequest::new().canonical();

    assert!(canonical.contains("limit=*"));
}

#[test]
fn fingerprint_is_a_sha256_hex_digest() {
    let fingerprint = sample().fingerprint();

    assert_eq!(fingerprint.len(), 64);
    assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(fingerprint, sample().fingerprint());
    assert_ne!(fingerprint, PageRequest::new().fingerprint());
}

#[test]
fn filter_values_evaluate_in_memory() {
    let any_of = FilterValue::Values(vec![Value::Text("red".into()), Value::Text("blue".into())]);
    assert!(any_of.applies(&Value::Text("red".into())));
    assert!(!any_of.applies(&Value::Text("green".into())));

    let bare = FilterValue::from(42i64);
    assert!(bare.applies(&Value::Int(42)));

    let criteria = FilterValue::from(Criteria::Like(Like::starts_with("user")));
    assert!(criteria.applies(&Value::Text("USER-1".into())));
}

#[test]
fn fetch_scoped_views_strip_the_prefix() {
    let request = PageRequest::new()
        .order_by("orders.name")
        .filter("orders.quantity", 2i64)
        .filter("name", "x");

    let filters = request.required_under("orders");
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].0, "quantity");

    let ordering = request.ordering_under("orders");
    assert_eq!(ordering.len(), 1);
    assert_eq!(ordering[0].0, "name");

    assert!(request.required_under("tags").is_empty());
}

#[test]
fn requests_round_trip_through_serde() {
    let request = sample();
    let json = serde_json::to_string(&request).unwrap();
    let back: PageRequest = serde_json::from_str(&json).unwrap();

    assert_eq!(back, request);
    assert_eq!(back.canonical(), request.canonical());
}
