use crate::model::EntityModel;
use crate::value::Value;

///
/// EntityKind
///
/// Contract between loaded entities and the paging core. Implementations
/// expose attribute values for in-memory evaluation and the collection
/// surface used by postponed-fetch post-processing.
///

pub trait EntityKind: Clone + 'static {
    /// Static metamodel for this entity type.
    const MODEL: &'static EntityModel;

    /// Value of a dot-separated attribute path.
    ///
    /// Contract:
    /// - scalar attributes yield their scalar `Value`
    /// - to-one steps traverse into the related entity
    /// - element collections yield `Value::List` of element values
    /// - paths through a to-many attribute yield `Value::List` of the
    ///   per-child values
    /// - absent data yields `Value::Null`
    fn value(&self, path: &str) -> Value;

    /// Identifier value; `id` is the reserved identifier path.
    fn id_value(&self) -> Value {
        self.value(crate::model::ID_FIELD)
    }

    /// Number of loaded children in a to-many collection.
    fn child_count(&self, _field: &str) -> usize {
        0
    }

    /// Attribute value of one loaded child in a to-many collection.
    fn child_value(&self, _field: &str, _index: usize, _attribute: &str) -> Value {
        Value::Null
    }

    /// Replace a to-many collection with the selected children, in
    /// selection order. This is the write-back half of postponed-fetch
    /// resolution.
    fn apply_child_selection(&mut self, _field: &str, _selection: &[usize]) {}
}
