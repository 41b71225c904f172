use pagekit::prelude::*;
use pagekit::{ErrorClass, ErrorOrigin};
use pagekit_core::model::{
    AttributeKind, AttributeModel, EntityModel, ScalarKind, register_model,
};
use pagekit_core::query::criteria::Like;

///
/// Item
///
/// Minimal fixture entity for exercising the facade surface.
///

static ITEM_ID: AttributeModel = AttributeModel {
    name: "id",
    kind: AttributeKind::Scalar(ScalarKind::Int64),
};

static ITEM_ATTRS: [AttributeModel; 1] = [AttributeModel {
    name: "name",
    kind: AttributeKind::Scalar(ScalarKind::Text),
}];

static ITEM: EntityModel = EntityModel {
    path: "service_tests::Item",
    entity_name: "Item",
    id: &ITEM_ID,
    attributes: &ITEM_ATTRS,
};

#[derive(Clone, Debug, PartialEq)]
struct Item {
    id: i64,
    name: String,
}

impl EntityKind for Item {
    const MODEL: &'static EntityModel = &ITEM;

    fn value(&self, path: &str) -> Value {
        match path {
            "id" => Value::Int(self.id),
            "name" => Value::Text(self.name.clone()),
            _ => Value::Null,
        }
    }
}

fn service() -> PageService<Item, MemoryBackend<Item>> {
    register_model(&ITEM);

    let rows = (1..=50i64)
        .map(|id| Item {
            id,
            name: format!("item-{id:02}"),
        })
        .collect();

    PageService::new(MemoryBackend::new(DialectProfile::lenient(), rows))
}

#[test]
fn pages_through_the_facade() {
    let service = service();
    let request = PageRequest::new().offset(10).limit(5).order_by("id");

    let page = service.get_page(&request, true).unwrap();

    let ids: Vec<i64> = page.items().iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![11, 12, 13, 14, 15]);
    assert_eq!(page.estimated_total(), 50);
}

#[test]
fn filters_and_counts_through_the_facade() {
    let service = service();
    let request = PageRequest::new()
        .limit(10)
        .order_by("id")
        .filter("name", Criteria::Like(Like::ends_with("7")));

    let page = service.get_page(&request, true).unwrap();

    // item-07, item-17, ..., item-47.
    assert_eq!(page.count(), 5);
    assert_eq!(page.estimated_total(), 5);
}

#[test]
fn core_errors_convert_to_the_public_taxonomy() {
    let service = service();
    let request = PageRequest::new().order_by("bogus");

    let err = service.get_page(&request, false).unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Order);
    assert!(err.to_string().contains("bogus"));
}

#[test]
fn customizers_receive_the_query_and_resolver() {
    let service = service();
    let request = PageRequest::new().limit(3).order_by("id");

    let page = service
        .get_page_with(&request, false, false, |query, _resolver| {
            query.hint("app.trace", "on");
        })
        .unwrap();

    assert_eq!(page.count(), 3);
    assert!(page.total().is_none());
}
