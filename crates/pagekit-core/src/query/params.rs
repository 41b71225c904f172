use crate::query::expr::Expr;
use crate::value::Value;
use std::collections::BTreeMap;

///
/// ParamBuilder
///
/// Per-field parameter factory scoped to one query. Names are
/// `{prefix}{index}` where the prefix is the sanitized field path
/// (`.` becomes `$`, then a trailing `_`), so names are unique within the
/// query by construction.
///

#[derive(Debug)]
pub struct ParamBuilder {
    prefix: String,
    bindings: BTreeMap<String, Value>,
}

impl ParamBuilder {
    #[must_use]
    pub fn new(field: &str) -> Self {
        let mut prefix = field.replace('.', "$").replace('@', "");
        prefix.push('_');

        Self {
            prefix,
            bindings: BTreeMap::new(),
        }
    }

    /// Bind a value and return the parameter expression referencing it.
    pub fn create(&mut self, value: impl Into<Value>) -> Expr {
        let name = format!("{}{}", self.prefix, self.bindings.len());
        self.bindings.insert(name.clone(), value.into());

        Expr::Param(name)
    }

    /// Number of bindings created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Drain the bindings into the enclosing query scope.
    #[must_use]
    pub fn into_bindings(self) -> BTreeMap<String, Value> {
        self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_prefixed_and_sequential() {
        let mut params = ParamBuilder::new("owner.name");

        assert_eq!(params.create(Value::Int(1)), Expr::Param("owner$name_0".into()));
        assert_eq!(params.create(Value::Int(2)), Expr::Param("owner$name_1".into()));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn bindings_carry_the_bound_values() {
        let mut params = ParamBuilder::new("age");
        params.create(Value::Int(30));

        let bindings = params.into_bindings();
        assert_eq!(bindings.get("age_0"), Some(&Value::Int(30)));
    }
}
