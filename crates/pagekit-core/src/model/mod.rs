#[cfg(test)]
mod tests;

use crate::value::casefold;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

///
/// Entity metamodel
///
/// Static, hand-written runtime models for the entities a paging service
/// operates on. The model is the source of truth for path resolution,
/// criteria dispatch, and relation-shape checks; no reflection, no
/// provider metamodel API.
///

///
/// ScalarKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarKind {
    Bool,
    Int32,
    Int64,
    Decimal,
    IntBig,
    Text,
    Date,
    Time,
    DateTime,
    DateTimeTz,
}

impl ScalarKind {
    /// True for the four numeric target types.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Decimal | Self::IntBig)
    }

    /// True for date/time shapes that need an explicit string-cast pattern.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::DateTime | Self::DateTimeTz)
    }
}

///
/// EnumStorage
///
/// How an enum attribute is stored by the mapper: by constant name or by
/// ordinal position.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnumStorage {
    Name,
    Ordinal,
}

///
/// EnumModel
///

#[derive(Debug, Eq, PartialEq)]
pub struct EnumModel {
    pub name: &'static str,
    /// Declaration order is the ordinal order.
    pub constants: &'static [&'static str],
    pub storage: EnumStorage,
}

impl EnumModel {
    /// Resolve a constant by case-insensitive name.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Option<&'static str> {
        let folded = casefold(text);
        self.constants
            .iter()
            .find(|constant| casefold(constant) == folded)
            .copied()
    }

    /// Ordinal of a constant, by exact name.
    #[must_use]
    pub fn ordinal(&self, constant: &str) -> Option<usize> {
        self.constants.iter().position(|c| *c == constant)
    }
}

///
/// AttributeKind
///
/// Relation targets are referenced by model path rather than by model
/// pointer so mutually-referencing entity models stay plain statics.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeKind {
    Scalar(ScalarKind),
    Enum(&'static EnumModel),
    ToOne { target_path: &'static str },
    OneToMany { target_path: &'static str },
    ElementCollection(ScalarKind),
    /// Declared but unmapped; resolution falls through to the to-one
    /// fallback exactly as for unknown attributes.
    Transient,
}

impl AttributeKind {
    /// True for collection-valued shapes (one-to-many or element
    /// collection).
    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(self, Self::OneToMany { .. } | Self::ElementCollection(_))
    }

    /// True for element collections.
    #[must_use]
    pub const fn is_element_collection(&self) -> bool {
        matches!(self, Self::ElementCollection(_))
    }
}

///
/// AttributeModel
///

#[derive(Debug)]
pub struct AttributeModel {
    pub name: &'static str,
    pub kind: AttributeKind,
}

///
/// EntityModel
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for registry lookup and diagnostics).
    pub path: &'static str,
    /// Stable external name used in query IR and diagnostics.
    pub entity_name: &'static str,
    /// Identifier attribute; the reserved field name `id` always resolves
    /// here regardless of the attribute's declared name.
    pub id: &'static AttributeModel,
    /// Ordered attribute list.
    pub attributes: &'static [AttributeModel],
}

impl EntityModel {
    /// Look up an attribute by name; `id` aliases the identifier.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeModel> {
        if name == ID_FIELD {
            return Some(self.id);
        }

        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// To-one attributes, in declaration order.
    pub fn to_one_attributes(&self) -> impl Iterator<Item = &'static AttributeModel> {
        self.attributes
            .iter()
            .filter(|attr| matches!(attr.kind, AttributeKind::ToOne { .. }))
    }
}

/// Reserved field name for the entity identifier.
pub const ID_FIELD: &str = "id";

///
/// Model registry
///
/// Process-wide map from model path to model, filled by entity
/// registration and read by dotted-path traversal. Registration is
/// idempotent.
///

static REGISTRY: OnceLock<Mutex<HashMap<&'static str, &'static EntityModel>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<&'static str, &'static EntityModel>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register an entity model under its path.
pub fn register_model(model: &'static EntityModel) {
    let mut map = registry().lock().expect("model registry poisoned");
    map.entry(model.path).or_insert(model);
}

/// Look up a registered entity model by path.
#[must_use]
pub fn lookup_model(path: &str) -> Option<&'static EntityModel> {
    let map = registry().lock().expect("model registry poisoned");
    map.get(path).copied()
}

///
/// RelationPaths
///
/// Per-entity-type sets of element-collection, to-many, and to-one
/// attribute names, precomputed once per type and shared read-only.
///

#[derive(Debug, Default)]
pub struct RelationPaths {
    pub element_collections: BTreeSet<&'static str>,
    pub to_many: BTreeSet<&'static str>,
    pub to_one: BTreeSet<&'static str>,
}

impl RelationPaths {
    fn compute(model: &'static EntityModel) -> Self {
        let mut paths = Self::default();
        for attr in model.attributes {
            match attr.kind {
                AttributeKind::ElementCollection(_) => {
                    paths.element_collections.insert(attr.name);
                    paths.to_many.insert(attr.name);
                }
                AttributeKind::OneToMany { .. } => {
                    paths.to_many.insert(attr.name);
                }
                AttributeKind::ToOne { .. } => {
                    paths.to_one.insert(attr.name);
                }
                AttributeKind::Scalar(_) | AttributeKind::Enum(_) | AttributeKind::Transient => {}
            }
        }

        paths
    }
}

static RELATION_PATHS: OnceLock<Mutex<HashMap<&'static str, Arc<RelationPaths>>>> = OnceLock::new();

/// Relation-path sets for an entity type, computed on first use.
#[must_use]
pub fn relation_paths(model: &'static EntityModel) -> Arc<RelationPaths> {
    let table = RELATION_PATHS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = table.lock().expect("relation path table poisoned");

    map.entry(model.path)
        .or_insert_with(|| Arc::new(RelationPaths::compute(model)))
        .clone()
}

/// True when any segment of a dotted field path traverses a
/// collection-valued attribute of the rooted entity graph.
#[must_use]
pub fn is_to_many_path(model: &'static EntityModel, field: &str) -> bool {
    let field = field.strip_prefix('@').unwrap_or(field);
    let mut current = model;

    for segment in field.split('.') {
        let Some(attr) = current.attribute(segment) else {
            return false;
        };

        match attr.kind {
            AttributeKind::OneToMany { .. } | AttributeKind::ElementCollection(_) => return true,
            AttributeKind::ToOne { target_path } => {
                let Some(next) = lookup_model(target_path) else {
                    return false;
                };
                current = next;
            }
            AttributeKind::Scalar(_) | AttributeKind::Enum(_) | AttributeKind::Transient => {
                return false;
            }
        }
    }

    false
}
