use crate::model::{
    AttributeKind, AttributeModel, EntityModel, EnumModel, EnumStorage, ScalarKind,
    register_model,
};
use crate::traits::EntityKind;
use crate::value::Value;

///
/// Fixture entities
///
/// A small customer graph covering every shape the engine dispatches on:
/// text, numbers, a name-stored and an ordinal-stored enum, a boolean, an
/// element collection, a one-to-many relation, and a to-one relation for
/// the transient fallback.
///

pub static STATUS: EnumModel = EnumModel {
    name: "Status",
    constants: &["ACTIVE", "INACTIVE"],
    storage: EnumStorage::Ordinal,
};

pub static TIER: EnumModel = EnumModel {
    name: "Tier",
    constants: &["FOO", "BAR"],
    storage: EnumStorage::Name,
};

static CUSTOMER_ID: AttributeModel = AttributeModel {
    name: "id",
    kind: AttributeKind::Scalar(ScalarKind::Int64),
};

static CUSTOMER_ATTRS: [AttributeModel; 9] = [
    AttributeModel {
        name: "name",
        kind: AttributeKind::Scalar(ScalarKind::Text),
    },
    AttributeModel {
        name: "code",
        kind: AttributeKind::Scalar(ScalarKind::Text),
    },
    AttributeModel {
        name: "status",
        kind: AttributeKind::Enum(&STATUS),
    },
    AttributeModel {
        name: "tier",
        kind: AttributeKind::Enum(&TIER),
    },
    AttributeModel {
        name: "age",
        kind: AttributeKind::Scalar(ScalarKind::Int32),
    },
    AttributeModel {
        name: "active",
        kind: AttributeKind::Scalar(ScalarKind::Bool),
    },
    AttributeModel {
        name: "tags",
        kind: AttributeKind::ElementCollection(ScalarKind::Text),
    },
    AttributeModel {
        name: "orders",
        kind: AttributeKind::OneToMany {
            target_path: ORDER_LINE_PATH,
        },
    },
    AttributeModel {
        name: "profile",
        kind: AttributeKind::ToOne {
            target_path: PROFILE_PATH,
        },
    },
];

pub static CUSTOMER: EntityModel = EntityModel {
    path: "pagekit_core::test_fixtures::Customer",
    entity_name: "Customer",
    id: &CUSTOMER_ID,
    attributes: &CUSTOMER_ATTRS,
};

const ORDER_LINE_PATH: &str = "pagekit_core::test_fixtures::OrderLine";

static ORDER_LINE_ID: AttributeModel = AttributeModel {
    name: "id",
    kind: AttributeKind::Scalar(ScalarKind::Int64),
};

static ORDER_LINE_ATTRS: [AttributeModel; 2] = [
    AttributeModel {
        name: "name",
        kind: AttributeKind::Scalar(ScalarKind::Text),
    },
    AttributeModel {
        name: "quantity",
        kind: AttributeKind::Scalar(ScalarKind::Int64),
    },
];

pub static ORDER_LINE: EntityModel = EntityModel {
    path: ORDER_LINE_PATH,
    entity_name: "OrderLine",
    id: &ORDER_LINE_ID,
    attributes: &ORDER_LINE_ATTRS,
};

const PROFILE_PATH: &str = "pagekit_core::test_fixtures::Profile";

static PROFILE_ID: AttributeModel = AttributeModel {
    name: "id",
    kind: AttributeKind::Scalar(ScalarKind::Int64),
};

static PROFILE_ATTRS: [AttributeModel; 1] = [AttributeModel {
    name: "city",
    kind: AttributeKind::Scalar(ScalarKind::Text),
}];

pub static PROFILE: EntityModel = EntityModel {
    path: PROFILE_PATH,
    entity_name: "Profile",
    id: &PROFILE_ID,
    attributes: &PROFILE_ATTRS,
};

/// Register the fixture models; idempotent.
pub fn register_models() {
    register_model(&CUSTOMER);
    register_model(&ORDER_LINE);
    register_model(&PROFILE);
}

///
/// OrderLine
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderLine {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(id: i64, name: &str, quantity: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            quantity,
        }
    }

    fn value(&self, attribute: &str) -> Value {
        match attribute {
            "id" => Value::Int(self.id),
            "name" => Value::Text(self.name.clone()),
            "quantity" => Value::Int(self.quantity),
            _ => Value::Null,
        }
    }
}

///
/// Profile
///

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub city: String,
}

impl Profile {
    fn value(&self, attribute: &str) -> Value {
        match attribute {
            "id" => Value::Int(self.id),
            "city" => Value::Text(self.city.clone()),
            _ => Value::Null,
        }
    }
}

///
/// Customer
///
/// Attribute values mirror storage: the ordinal-stored `status` reads as
/// its ordinal, the name-stored `tier` as its constant name.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub status: &'static str,
    pub tier: &'static str,
    pub age: i64,
    pub active: bool,
    pub tags: Vec<String>,
    pub orders: Vec<OrderLine>,
    pub profile: Option<Profile>,
}

impl Customer {
    pub fn new(id: i64, name: &str) -> Self {
        register_models();

        Self {
            id,
            name: name.to_string(),
            code: String::new(),
            status: "ACTIVE",
            tier: "FOO",
            age: 30,
            active: true,
            tags: Vec::new(),
            orders: Vec::new(),
            profile: None,
        }
    }

    pub fn code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    pub const fn status(mut self, status: &'static str) -> Self {
        self.status = status;
        self
    }

    pub const fn tier(mut self, tier: &'static str) -> Self {
        self.tier = tier;
        self
    }

    pub const fn age(mut self, age: i64) -> Self {
        self.age = age;
        self
    }

    pub const fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|tag| (*tag).to_string()).collect();
        self
    }

    pub fn orders(mut self, orders: Vec<OrderLine>) -> Self {
        self.orders = orders;
        self
    }

    pub fn profile(mut self, id: i64, city: &str) -> Self {
        self.profile = Some(Profile {
            id,
            city: city.to_string(),
        });
        self
    }
}

impl EntityKind for Customer {
    const MODEL: &'static EntityModel = &CUSTOMER;

    fn value(&self, path: &str) -> Value {
        match path.split_once('.') {
            None => match path {
                "id" => Value::Int(self.id),
                "name" => Value::Text(self.name.clone()),
                "code" => Value::Text(self.code.clone()),
                "status" => STATUS
                    .ordinal(self.status)
                    .map_or(Value::Null, |ordinal| Value::Int(ordinal as i64)),
                "tier" => Value::Enum(self.tier.to_string()),
                "age" => Value::Int(self.age),
                "active" => Value::Bool(self.active),
                "tags" => Value::List(
                    self.tags
                        .iter()
                        .map(|tag| Value::Text(tag.clone()))
                        .collect(),
                ),
                "orders" => Value::List(
                    self.orders
                        .iter()
                        .map(|order| Value::Int(order.id))
                        .collect(),
                ),
                _ => Value::Null,
            },
            Some(("profile", rest)) => self
                .profile
                .as_ref()
                .map_or(Value::Null, |profile| profile.value(rest)),
            Some(("orders", rest)) => Value::List(
                self.orders
                    .iter()
                    .map(|order| order.value(rest))
                    .collect(),
            ),
            _ => Value::Null,
        }
    }

    fn child_count(&self, field: &str) -> usize {
        if field == "orders" { self.orders.len() } else { 0 }
    }

    fn child_value(&self, field: &str, index: usize, attribute: &str) -> Value {
        if field != "orders" {
            return Value::Null;
        }

        self.orders
            .get(index)
            .map_or(Value::Null, |order| order.value(attribute))
    }

    fn apply_child_selection(&mut self, field: &str, selection: &[usize]) {
        if field != "orders" {
            return;
        }

        self.orders = selection
            .iter()
            .filter_map(|&index| self.orders.get(index).cloned())
            .collect();
    }
}

/// Seed `count` customers with ids `1..=count` and names
/// `user-001`, `user-002`, ...
pub fn seed_users(count: i64) -> Vec<Customer> {
    (1..=count)
        .map(|id| Customer::new(id, &format!("user-{id:03}")))
        .collect()
}
