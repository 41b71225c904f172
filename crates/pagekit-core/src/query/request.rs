#[cfg(test)]
mod tests;

use crate::query::criteria::Criteria;
use crate::query::plan::OrderDirection;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

///
/// FilterValue
///
/// One entry in a criteria map: a typed criteria wrapper, a bare value
/// (plain equality), or a sequence of values (equals any of).
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum FilterValue {
    Value(Value),
    Values(Vec<Value>),
    Criteria(Criteria),
}

impl FilterValue {
    /// True when the entry is a null marker or a criteria carrying one.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Self::Value(value) => value.is_null(),
            Self::Values(_) => false,
            Self::Criteria(criteria) => criteria.carries_null(),
        }
    }

    /// In-memory evaluation of this entry against a plain value, the
    /// counterpart of its predicate form.
    #[must_use]
    pub fn applies(&self, value: &Value) -> bool {
        match self {
            Self::Value(expected) => value.loose_eq(expected),
            Self::Values(items) => items.iter().any(|item| value.loose_eq(item)),
            Self::Criteria(criteria) => criteria.applies(value),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Criteria> for FilterValue {
    fn from(value: Criteria) -> Self {
        Self::Criteria(value)
    }
}

impl From<Vec<Value>> for FilterValue {
    fn from(values: Vec<Value>) -> Self {
        Self::Values(values)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::Int(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Values(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Criteria(criteria) => write!(f, "{criteria}"),
        }
    }
}

/// Sentinel limit meaning "unbounded".
pub const UNBOUNDED: u64 = u64::MAX;

///
/// PageRequest
///
/// Declarative page request: pagination range, ordering sequence, and the
/// required (conjunctive) and optional (disjunctive) criteria maps, both
/// insertion-ordered.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PageRequest {
    offset: u64,
    limit: u64,
    order: Vec<(String, OrderDirection)>,
    required: Vec<(String, FilterValue)>,
    optional: Vec<(String, FilterValue)>,
}

impl PageRequest {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: 0,
            limit: UNBOUNDED,
            order: Vec::new(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Append an ascending sort key; the first entry is the primary sort.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), OrderDirection::Asc));
        self
    }

    /// Append a descending sort key.
    #[must_use]
    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order.push((field.into(), OrderDirection::Desc));
        self
    }

    /// Add a required criteria entry; required entries are conjoined.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.required.push((field.into(), value.into()));
        self
    }

    /// Add an optional criteria entry; optional entries are disjoined
    /// among themselves and conjoined with the required set.
    #[must_use]
    pub fn filter_any(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.optional.push((field.into(), value.into()));
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn page_offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub const fn page_limit(&self) -> u64 {
        self.limit
    }

    #[must_use]
    pub fn ordering(&self) -> &[(String, OrderDirection)] {
        &self.order
    }

    #[must_use]
    pub fn required(&self) -> &[(String, FilterValue)] {
        &self.required
    }

    #[must_use]
    pub fn optional(&self) -> &[(String, FilterValue)] {
        &self.optional
    }

    /// Required criteria scoped to one fetch path: entries whose field
    /// starts with `{path}.`, keyed by the remainder.
    #[must_use]
    pub fn required_under(&self, path: &str) -> Vec<(&str, &FilterValue)> {
        let prefix = format!("{path}.");
        self.required
            .iter()
            .filter_map(|(field, value)| {
                field
                    .strip_prefix(&prefix)
                    .map(|attribute| (attribute, value))
            })
            .collect()
    }

    /// Ordering entries scoped to one fetch path.
    #[must_use]
    pub fn ordering_under(&self, path: &str) -> Vec<(&str, OrderDirection)> {
        let prefix = format!("{path}.");
        self.order
            .iter()
            .filter_map(|(field, direction)| {
                field
                    .strip_prefix(&prefix)
                    .map(|attribute| (attribute, *direction))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Canonical form
    // ------------------------------------------------------------------

    /// Canonical textual form: stable across runs and independent of map
    /// iteration noise. Criteria entries are listed in a total order over
    /// field paths.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = format!("page{{offset={}, limit=", self.offset);
        if self.limit == UNBOUNDED {
            out.push('*');
        } else {
            out.push_str(&self.limit.to_string());
        }

        out.push_str(", order=[");
        for (i, (field, direction)) in self.order.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(field);
            out.push(' ');
            out.push_str(direction.label());
        }
        out.push(']');

        canonical_criteria(&mut out, "required", &self.required);
        canonical_criteria(&mut out, "optional", &self.optional);
        out.push('}');

        out
    }

    /// SHA-256 hex digest of the canonical form, used as the cache region
    /// key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            out.push_str(&format!("{byte:02x}"));
        }

        out
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical_criteria(out: &mut String, label: &str, entries: &[(String, FilterValue)]) {
    let mut sorted: Vec<&(String, FilterValue)> = entries.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    out.push_str(", ");
    out.push_str(label);
    out.push_str("={");
    for (i, (field, value)) in sorted.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(field);
        out.push('=');
        out.push_str(&value.to_string());
    }
    out.push('}');
}
