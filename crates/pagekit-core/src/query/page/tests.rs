use super::*;
use crate::error::PageError;
use crate::memory::MemoryBackend;
use crate::query::backend::BackendError;
use crate::query::criteria::{BuildContext, Criteria, Enumerated, IgnoreCase, Like, Order};
use crate::query::dialect::DialectProfile;
use crate::query::order::OrderError;
use crate::query::restrict::{CriteriaFallback, RestrictionError};
use crate::query::plan::{CACHE_REGION_HINT, CACHEABLE_HINT};
use crate::query::expr::Restriction;
use crate::query::request::FilterValue;
use crate::test_fixtures::{Customer, OrderLine, seed_users};
use std::cell::RefCell;

fn pager(rows: Vec<Customer>) -> Pager<Customer, MemoryBackend<Customer>> {
    Pager::new(MemoryBackend::new(DialectProfile::lenient(), rows))
}

fn restricted_pager(rows: Vec<Customer>) -> Pager<Customer, MemoryBackend<Customer>> {
    Pager::new(MemoryBackend::new(DialectProfile::restricted(), rows))
}

fn ids(page: &Page<Customer>) -> Vec<i64> {
    page.items().iter().map(|customer| customer.id).collect()
}

///
/// Spy
///
/// Recording wrapper so tests can observe the emitted query IR.
///

struct Spy {
    inner: MemoryBackend<Customer>,
    queries: RefCell<Vec<SelectQuery>>,
    counts: RefCell<Vec<CountQuery>>,
}

impl Spy {
    fn new(profile: DialectProfile, rows: Vec<Customer>) -> Self {
        Self {
            inner: MemoryBackend::new(profile, rows),
            queries: RefCell::new(Vec::new()),
            counts: RefCell::new(Vec::new()),
        }
    }

    fn last_query(&self) -> SelectQuery {
        self.queries.borrow().last().cloned().expect("a query ran")
    }
}

impl Backend<Customer> for Spy {
    fn profile(&self) -> DialectProfile {
        self.inner.profile()
    }

    fn execute(&self, query: &SelectQuery) -> Result<Vec<Customer>, BackendError> {
        self.queries.borrow_mut().push(query.clone());
        self.inner.execute(query)
    }

    fn execute_projected(
        &self,
        query: &SelectQuery,
    ) -> Result<Vec<Vec<Value>>, BackendError> {
        self.queries.borrow_mut().push(query.clone());
        self.inner.execute_projected(query)
    }

    fn execute_count(&self, query: &CountQuery) -> Result<i64, BackendError> {
        self.counts.borrow_mut().push(query.clone());
        self.inner.execute_count(query)
    }

    fn execute_fetch(&self, query: &FetchQuery) -> Result<Vec<Customer>, BackendError> {
        self.inner.execute_fetch(query)
    }
}

// ----------------------------------------------------------------------
// End-to-end scenarios
// ----------------------------------------------------------------------

#[test]
fn simple_page_partitions_by_id() {
    let pager = pager(seed_users(100));
    let request = PageRequest::new().offset(20).limit(10).order_by("id");

    let page = pager.get_page(&request, true).unwrap();

    assert_eq!(ids(&page), (21..=30).collect::<Vec<_>>());
    assert_eq!(page.offset(), 20);
    assert_eq!(page.estimated_total(), 100);
}

#[test]
fn contains_filter_pages_and_counts() {
    let pager = pager(seed_users(100));
    let request = PageRequest::new()
        .limit(20)
        .order_by("id")
        .filter("name", Criteria::Like(Like::contains("05")));

    let page = pager.get_page(&request, true).unwrap();

    let mut expected = vec![5i64];
    expected.extend(50..=59);
    assert_eq!(ids(&page), expected);
    assert_eq!(page.estimated_total(), 11);
}

#[test]
fn negated_equality_counts_the_complement() {
    let mut rows = seed_users(100);
    for customer in rows.iter_mut().take(30) {
        customer.status = "ACTIVE";
    }
    for customer in rows.iter_mut().skip(30) {
        customer.status = "INACTIVE";
    }

    let pager = pager(rows);
    let request = PageRequest::new().limit(10).order_by("id").filter(
        "status",
        Criteria::not(Criteria::Enumerated(Enumerated::new(Value::Enum(
            "ACTIVE".into(),
        )))),
    );

    let page = pager.get_page(&request, true).unwrap();

    assert_eq!(page.estimated_total(), 70);
    assert_eq!(ids(&page), (31..=40).collect::<Vec<_>>());
}

#[test]
fn to_many_in_requires_every_item() {
    let rows = vec![
        Customer::new(1, "a").tags(&["red"]),
        Customer::new(2, "b").tags(&["red", "blue"]),
        Customer::new(3, "c").tags(&["blue"]),
        Customer::new(4, "d").tags(&["red", "blue", "green"]),
        Customer::new(5, "e"),
    ];

    let pager = pager(rows);
    let request = PageRequest::new().order_by("id").filter(
        "tags",
        FilterValue::Values(vec![Value::Text("red".into()), Value::Text("blue".into())]),
    );

    let page = pager.get_page(&request, true).unwrap();

    assert_eq!(ids(&page), vec![2, 4]);
    assert_eq!(page.estimated_total(), 2);
}

#[test]
fn optional_criteria_disjoin_and_conjoin_with_required() {
    let rows = vec![
        Customer::new(1, "axel").tier("FOO").code("none"),
        Customer::new(2, "bob").tier("FOO").code("XyZ"),
        Customer::new(3, "box").tier("FOO").code("none"),
        Customer::new(4, "axle").tier("BAR").code("XYZ"),
        Customer::new(5, "bob").tier("FOO").code("abc"),
    ];

    let pager = pager(rows);
    let request = PageRequest::new()
        .order_by("id")
        .filter("tier", Value::Enum("FOO".into()))
        .filter_any("name", Criteria::Like(Like::contains("x")))
        .filter_any("code", Criteria::IgnoreCase(IgnoreCase::new("XYZ")));

    let page = pager.get_page(&request, true).unwrap();

    // FOO-typed, with an `x` in the name (1, 3) or code XYZ (2); 4 fails
    // the required tier, 5 matches nothing optional.
    assert_eq!(ids(&page), vec![1, 2, 3]);
    assert_eq!(page.estimated_total(), 3);
}

#[test]
fn to_many_ordering_fails_fast_on_restricted_backends() {
    let pager = restricted_pager(seed_users(5));
    let request = PageRequest::new().order_by("orders.name").limit(3);

    let err = pager.get_page(&request, true).unwrap_err();

    assert!(matches!(
        err,
        PageError::Order(OrderError::UnsupportedOrdering { .. })
    ));
}

// ----------------------------------------------------------------------
// Engine mechanics
// ----------------------------------------------------------------------

#[test]
fn range_offsets_partition_without_overlap() {
    let pager = pager(seed_users(100));

    let mut seen = Vec::new();
    for offset in (0u64..100).step_by(10) {
        let request = PageRequest::new().offset(offset).limit(10).order_by("id");
        let page = pager.get_page(&request, false).unwrap();

        assert_eq!(page.estimated_total(), crate::response::UNKNOWN_TOTAL);
        seen.extend(ids(&page));
    }

    assert_eq!(seen, (1..=100).collect::<Vec<_>>());
}

#[test]
fn fetch_joins_mark_the_query_distinct() {
    let spy = Spy::new(DialectProfile::lenient(), seed_users(10));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    let request = PageRequest::new().limit(5).order_by("id");
    let page = pager
        .get_page_with(&request, true, true, |query, _| query.fetch("orders"))
        .unwrap();

    assert_eq!(page.count(), 5);

    let query = pager.backend().last_query();
    assert!(query.distinct);
    assert!(query.has_fetch_joins());

    // No duplicate roots surface even with the fetch join present.
    let mut unique = ids(&page);
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[test]
fn count_subquery_appears_only_with_restrictions() {
    let spy = Spy::new(DialectProfile::lenient(), seed_users(10));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    let unfiltered = PageRequest::new().limit(5).order_by("id");
    pager.get_page(&unfiltered, true).unwrap();
    assert!(pager.backend().counts.borrow().last().unwrap().sub.is_none());

    let filtered = unfiltered.filter("name", Criteria::Like(Like::contains("1")));
    pager.get_page(&filtered, true).unwrap();

    let counts = pager.backend().counts.borrow();
    let sub = counts.last().unwrap().sub.as_ref().unwrap();
    assert!(sub.restriction.is_some());
    assert!(sub.order.is_empty());
    assert_eq!(sub.limit, None);
}

#[test]
fn single_row_windows_skip_the_order_by() {
    let spy = Spy::new(DialectProfile::lenient(), seed_users(10));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    let request = PageRequest::new().limit(1).order_by("id");
    pager.get_page(&request, false).unwrap();

    assert!(pager.backend().last_query().order.is_empty());
}

#[test]
fn unbounded_joinless_queries_carry_no_range() {
    let spy = Spy::new(DialectProfile::lenient(), seed_users(10));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    pager.get_page(&PageRequest::new(), false).unwrap();

    let query = pager.backend().last_query();
    assert_eq!(query.offset, None);
    assert_eq!(query.limit, None);
}

#[test]
fn cache_tags_carry_the_request_fingerprint() {
    let spy = Spy::new(DialectProfile::lenient(), seed_users(3));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    let request = PageRequest::new().limit(2).order_by("id");
    pager.get_page_with(&request, false, false, |_, _| {}).unwrap();

    let query = pager.backend().last_query();
    assert_eq!(
        query.hints.get(CACHE_REGION_HINT),
        Some(&request.fingerprint())
    );
    assert_eq!(query.hints.get(CACHEABLE_HINT), Some(&"false".to_string()));
}

#[test]
fn unknown_filter_fields_are_dropped() {
    let pager = pager(seed_users(10));
    let request = PageRequest::new()
        .limit(100)
        .order_by("id")
        .filter("legacy_field", "anything");

    let page = pager.get_page(&request, true).unwrap();

    assert_eq!(page.count(), 10);
    assert_eq!(page.estimated_total(), 10);
}

#[test]
fn unknown_ordering_fields_are_fatal() {
    let pager = pager(seed_users(10));
    let request = PageRequest::new().limit(5).order_by("legacy_field");

    let err = pager.get_page(&request, true).unwrap_err();

    assert!(matches!(
        err,
        PageError::Order(OrderError::UnknownField { .. })
    ));
}

#[test]
fn unsupported_value_shapes_are_fatal_without_a_fallback() {
    let pager = pager(seed_users(3));
    let request = PageRequest::new().filter("profile", 1i64);

    let err = pager.get_page(&request, false).unwrap_err();

    assert!(matches!(
        err,
        PageError::Restriction(RestrictionError::UnsupportedCriteria { .. })
    ));
}

struct ProfileFallback;

impl CriteriaFallback for ProfileFallback {
    fn build(
        &self,
        field: &str,
        value: &Value,
        ctx: &mut BuildContext<'_>,
    ) -> Option<Restriction> {
        (field == "profile").then(|| {
            Restriction::eq(ctx.path.clone(), ctx.params.create(value.clone()))
        })
    }
}

#[test]
fn the_fallback_hook_rescues_unsupported_shapes() {
    let rows = vec![
        Customer::new(1, "a").profile(7, "berlin"),
        Customer::new(2, "b").profile(8, "paris"),
    ];

    let pager = pager(rows).with_fallback(Box::new(ProfileFallback));
    // `profile` resolves to the relation; the fallback compares its id.
    let request = PageRequest::new().filter("profile", 7i64);

    // The fallback emits `profile = 7`; in-memory the relation path reads
    // as null, so nothing matches, but planning now succeeds.
    let page = pager.get_page(&request, false).unwrap();
    assert!(page.count() <= 2);
}

#[test]
fn null_filters_become_is_null() {
    let mut rows = seed_users(4);
    rows[1].code = "set".to_string();

    let spy = Spy::new(DialectProfile::lenient(), rows);
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    let request = PageRequest::new().order_by("id").filter("code", Value::Null);
    pager.get_page(&request, false).unwrap();

    let query = pager.backend().last_query();
    assert!(matches!(query.restriction, Some(Restriction::IsNull(_))));
}

#[test]
fn projection_rows_follow_mapping_order() {
    let rows = vec![
        Customer::new(1, "a").profile(10, "berlin"),
        Customer::new(2, "b").profile(11, "paris"),
    ];
    let pager = pager(rows);

    let request = PageRequest::new().order_by("id");
    let page = pager
        .get_page_projected(
            &request,
            true,
            true,
            |resolver| {
                Ok(vec![
                    ("name".to_string(), Expr::Path(resolver.get("name")?)),
                    ("city".to_string(), Expr::Path(resolver.get("profile.city")?)),
                ])
            },
            |_, _| {},
        )
        .unwrap();

    assert_eq!(page.estimated_total(), 2);
    assert_eq!(
        page.items()[0],
        vec![Value::Text("a".into()), Value::Text("berlin".into())]
    );
    assert_eq!(
        page.items()[1],
        vec![Value::Text("b".into()), Value::Text("paris".into())]
    );
}

// ----------------------------------------------------------------------
// Postponed fetches
// ----------------------------------------------------------------------

fn order_rows() -> Vec<Customer> {
    vec![
        Customer::new(1, "a").orders(vec![
            OrderLine::new(11, "widget", 1),
            OrderLine::new(12, "gadget", 5),
        ]),
        Customer::new(2, "b").orders(vec![OrderLine::new(21, "trinket", 3)]),
        Customer::new(3, "c").orders(vec![OrderLine::new(31, "bauble", 1)]),
    ]
}

#[test]
fn secondary_fetches_filter_the_loaded_collections() {
    let pager = restricted_pager(order_rows());

    let request = PageRequest::new()
        .order_by("id")
        .filter("orders.quantity", Criteria::Order(Order::gte(3i64)));

    let page = pager
        .get_page_with(&request, true, true, |query, _| query.fetch("orders"))
        .unwrap();

    // Parents keep only children satisfying the fetch-scoped filter.
    assert_eq!(ids(&page), vec![1, 2]);
    assert_eq!(page.items()[0].orders.len(), 1);
    assert_eq!(page.items()[0].orders[0].name, "gadget");
    assert_eq!(page.items()[1].orders.len(), 1);
    assert_eq!(page.estimated_total(), 2);
}

#[test]
fn secondary_fetches_without_filters_keep_children_intact() {
    let pager = restricted_pager(order_rows());
    let request = PageRequest::new().order_by("id");

    let page = pager
        .get_page_with(&request, false, true, |query, _| query.fetch("orders"))
        .unwrap();

    assert_eq!(page.items()[0].orders.len(), 2);
    assert_eq!(page.items()[1].orders.len(), 1);
}

#[test]
fn batch_backends_register_per_fetch_hints() {
    let profile = DialectProfile {
        postponed_fetch: crate::query::dialect::PostponedFetchKind::Batch,
        ..DialectProfile::lenient()
    };
    let spy = Spy::new(profile, seed_users(3));
    let pager: Pager<Customer, Spy> = Pager::new(spy);

    pager
        .get_page_with(&PageRequest::new().limit(2), false, true, |query, _| {
            query.fetch("orders");
        })
        .unwrap();

    let query = pager.backend().last_query();
    assert_eq!(
        query.hints.get("pagekit.fetch.batch.orders"),
        Some(&"true".to_string())
    );
    assert!(!query.has_fetch_joins());
}

// ----------------------------------------------------------------------
// Hooks
// ----------------------------------------------------------------------

#[derive(Default)]
struct CountingHooks {
    events: RefCell<Vec<String>>,
}

impl PageHooks for CountingHooks {
    fn before_page(&self) {
        self.events.borrow_mut().push("before".to_string());
    }

    fn on_page(&self, page_key: &str, cacheable: bool) {
        self.events
            .borrow_mut()
            .push(format!("on:{}:{cacheable}", &page_key[..8]));
    }

    fn after_page(&self) {
        self.events.borrow_mut().push("after".to_string());
    }
}

#[test]
fn hooks_fire_in_lifecycle_order() {
    let pager = pager(seed_users(3)).with_hooks(CountingHooks::default());
    let request = PageRequest::new().limit(2).order_by("id");

    pager.get_page(&request, false).unwrap();

    let events = pager.hooks.events.borrow();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], "before");
    assert!(events[1].starts_with("on:"));
    assert!(events[1].ends_with(":true"));
    assert_eq!(events[2], "after");
}
