use crate::query::backend::{Backend, BackendError};
use crate::query::dialect::DialectProfile;
use crate::query::expr::{AggregateKind, CompareOp, Expr, Restriction};
use crate::query::plan::{CountQuery, FetchQuery, OrderDirection, SelectQuery};
use crate::query::select::Selection;
use crate::traits::EntityKind;
use crate::value::{Value, casefold};
use std::cmp::Ordering;
use std::collections::BTreeMap;

///
/// MemoryBackend
///
/// Reference executor over plain entity vectors. Interprets the query IR
/// with the same semantics a relational backend would observe per root
/// row, and doubles as the toy relational evaluation the criteria
/// round-trip tests are specified against.
///
/// Restriction evaluation is per-entity; a path through a to-many
/// attribute yields the element list and comparison operators take
/// any-element semantics, mirroring join row fan-out.
///

pub struct MemoryBackend<E> {
    profile: DialectProfile,
    rows: Vec<E>,
}

impl<E: EntityKind> MemoryBackend<E> {
    #[must_use]
    pub const fn new(profile: DialectProfile, rows: Vec<E>) -> Self {
        Self { profile, rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    fn matching(&self, query: &SelectQuery) -> Vec<E> {
        let mut rows: Vec<E> = self
            .rows
            .iter()
            .filter(|entity| {
                query
                    .restriction
                    .as_ref()
                    .is_none_or(|restriction| eval(*entity, restriction, &query.params, None))
            })
            .filter(|entity| {
                query
                    .having
                    .as_ref()
                    .is_none_or(|having| eval_having(*entity, having, query))
            })
            .cloned()
            .collect();

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                for (expr, direction) in &query.order {
                    let left = eval_expr(a, expr, &query.params, None);
                    let right = eval_expr(b, expr, &query.params, None);
                    let cmp = match direction {
                        OrderDirection::Asc => left.canonical_cmp(&right),
                        OrderDirection::Desc => left.canonical_cmp(&right).reverse(),
                    };
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }

                Ordering::Equal
            });
        }

        if query.distinct {
            let mut seen: Vec<Value> = Vec::new();
            rows.retain(|entity| {
                let id = entity.id_value();
                if seen.contains(&id) {
                    false
                } else {
                    seen.push(id);
                    true
                }
            });
        }

        let offset = usize::try_from(query.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        rows.into_iter().skip(offset).take(limit).collect()
    }
}

impl<E: EntityKind> Backend<E> for MemoryBackend<E> {
    fn profile(&self) -> DialectProfile {
        self.profile
    }

    fn execute(&self, query: &SelectQuery) -> Result<Vec<E>, BackendError> {
        Ok(self.matching(query))
    }

    fn execute_projected(&self, query: &SelectQuery) -> Result<Vec<Vec<Value>>, BackendError> {
        let Selection::Projection(properties) = &query.selection else {
            return Err(BackendError::new(
                "projected execution requires a projection selection",
            ));
        };

        let rows = self.matching(query);
        Ok(rows
            .iter()
            .map(|entity| {
                properties
                    .iter()
                    .map(|property| eval_expr(entity, &property.expr, &query.params, None))
                    .collect()
            })
            .collect())
    }

    fn execute_count(&self, query: &CountQuery) -> Result<i64, BackendError> {
        let count = match &query.sub {
            // All count-subquery shapes agree on semantics: the number of
            // distinct roots matching the inner restrictions.
            Some(sub) => {
                let mut inner = (**sub).clone();
                inner.distinct = true;
                inner.offset = None;
                inner.limit = None;
                self.matching(&inner).len()
            }
            None => self.rows.len(),
        };

        i64::try_from(count).map_err(|_| BackendError::new("row count exceeds i64"))
    }

    fn execute_fetch(&self, query: &FetchQuery) -> Result<Vec<E>, BackendError> {
        // Collections are always loaded on in-memory rows; the fetch is a
        // plain id lookup.
        Ok(self
            .rows
            .iter()
            .filter(|entity| query.ids.contains(&entity.id_value()))
            .cloned()
            .collect())
    }
}

// ----------------------------------------------------------------------
// Expression evaluation
// ----------------------------------------------------------------------

pub(crate) type ElementOverride<'a> = Option<(&'a str, &'a Value)>;

fn eval_expr<E: EntityKind>(
    entity: &E,
    expr: &Expr,
    params: &BTreeMap<String, Value>,
    element: ElementOverride<'_>,
) -> Value {
    match expr {
        Expr::Root => entity.id_value(),
        Expr::Path(path) => match element {
            Some((field, value)) if field == path.field => value.clone(),
            _ => entity.value(&path.field),
        },
        Expr::Param(name) => params.get(name).cloned().unwrap_or(Value::Null),
        Expr::Literal(value) => value.clone(),
        Expr::Lower(inner) => {
            map_text(eval_expr(entity, inner, params, element), |text| {
                casefold(&text)
            })
        }
        Expr::CastText { inner, .. } => {
            map_text(eval_expr(entity, inner, params, element), |text| text)
        }
        Expr::Aggregate { kind, inner } => {
            let value = eval_expr(entity, inner, params, element);
            let items = match value {
                Value::List(items) => items,
                Value::Null => Vec::new(),
                single => vec![single],
            };

            match kind {
                AggregateKind::Count => Value::Int(items.len() as i64),
                AggregateKind::CountDistinct => {
                    let mut distinct: Vec<Value> = Vec::new();
                    for item in items {
                        if !distinct.contains(&item) {
                            distinct.push(item);
                        }
                    }
                    Value::Int(distinct.len() as i64)
                }
                AggregateKind::Min => items
                    .into_iter()
                    .min_by(|a, b| a.canonical_cmp(b))
                    .unwrap_or(Value::Null),
                AggregateKind::Max => items
                    .into_iter()
                    .max_by(|a, b| a.canonical_cmp(b))
                    .unwrap_or(Value::Null),
                AggregateKind::Sum | AggregateKind::Avg => sum_or_avg(items, *kind),
            }
        }
    }
}

fn sum_or_avg(items: Vec<Value>, kind: AggregateKind) -> Value {
    let mut total = 0i64;
    let mut count = 0i64;
    for item in items {
        if let Value::Int(n) = item {
            total += n;
            count += 1;
        }
    }

    match kind {
        AggregateKind::Avg if count > 0 => Value::Int(total / count),
        AggregateKind::Avg => Value::Null,
        _ => Value::Int(total),
    }
}

// Apply a text transform to a scalar's rendering; lists map element-wise.
fn map_text(value: Value, transform: impl Fn(String) -> String + Copy) -> Value {
    match value {
        Value::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| map_text(item, transform))
                .collect(),
        ),
        Value::Null => Value::Null,
        other => other
            .to_text()
            .map_or(Value::Null, |text| Value::Text(transform(text))),
    }
}

// ----------------------------------------------------------------------
// Restriction evaluation
// ----------------------------------------------------------------------

pub(crate) fn eval<E: EntityKind>(
    entity: &E,
    restriction: &Restriction,
    params: &BTreeMap<String, Value>,
    element: ElementOverride<'_>,
) -> bool {
    match restriction {
        Restriction::And(parts) => parts.iter().all(|part| eval(entity, part, params, element)),
        Restriction::Or(parts) => parts.iter().any(|part| eval(entity, part, params, element)),
        Restriction::Not(inner) => !eval(entity, inner, params, element),
        Restriction::Compare { left, op, right } => {
            let left = eval_expr(entity, left, params, element);
            let right = eval_expr(entity, right, params, element);
            any_element(&left, |item| compare(item, *op, &right))
        }
        Restriction::Between { expr, lo, hi } => {
            let value = eval_expr(entity, expr, params, element);
            let lo = eval_expr(entity, lo, params, element);
            let hi = eval_expr(entity, hi, params, element);
            any_element(&value, |item| {
                compare(item, CompareOp::Gte, &lo) && compare(item, CompareOp::Lte, &hi)
            })
        }
        Restriction::In { expr, items } => {
            let value = eval_expr(entity, expr, params, element);
            let items: Vec<Value> = items
                .iter()
                .map(|item| eval_expr(entity, item, params, element))
                .collect();
            any_element(&value, |candidate| {
                items.iter().any(|item| candidate.loose_eq(item))
            })
        }
        Restriction::Like { expr, pattern } => {
            let value = eval_expr(entity, expr, params, element);
            let Some(pattern) = eval_expr(entity, pattern, params, element).to_text() else {
                return false;
            };
            any_element(&value, |item| {
                item.to_text().is_some_and(|text| like_match(&text, &pattern))
            })
        }
        Restriction::IsNull(expr) => eval_expr(entity, expr, params, element).is_null(),
        Restriction::IsTrue(expr) => {
            eval_expr(entity, expr, params, element).truthy() == Some(true)
        }
        Restriction::IsFalse(expr) => {
            eval_expr(entity, expr, params, element).truthy() == Some(false)
        }
        Restriction::AlwaysFalse => false,
    }
}

// HAVING trees run against grouped roots. Aggregate comparisons over a
// collection path count only the elements that also satisfy the WHERE
// tree, matching `GROUP BY root` + `HAVING COUNT(DISTINCT join)` over the
// surviving join rows.
fn eval_having<E: EntityKind>(entity: &E, having: &Restriction, query: &SelectQuery) -> bool {
    match having {
        Restriction::And(parts) => parts.iter().all(|part| eval_having(entity, part, query)),
        Restriction::Or(parts) => parts.iter().any(|part| eval_having(entity, part, query)),
        Restriction::Not(inner) => !eval_having(entity, inner, query),
        Restriction::Compare { left, op, right } => {
            if let Expr::Aggregate {
                kind: AggregateKind::CountDistinct,
                inner,
            } = left
                && let Some(path) = inner.path()
            {
                let elements = match entity.value(&path.field) {
                    Value::List(items) => items,
                    Value::Null => Vec::new(),
                    single => vec![single],
                };

                let mut survivors: Vec<Value> = Vec::new();
                for element in elements {
                    let keep = query.restriction.as_ref().is_none_or(|restriction| {
                        eval(entity, restriction, &query.params, Some((&path.field, &element)))
                    });
                    if keep && !survivors.contains(&element) {
                        survivors.push(element);
                    }
                }

                let count = Value::Int(survivors.len() as i64);
                let right = eval_expr(entity, right, &query.params, None);
                return compare(&count, *op, &right);
            }

            eval(entity, having, &query.params, None)
        }
        other => eval(entity, other, &query.params, None),
    }
}

// Join fan-out semantics: a list value matches when any element does.
fn any_element(value: &Value, mut predicate: impl FnMut(&Value) -> bool) -> bool {
    match value {
        Value::List(items) => items.iter().any(|item| predicate(item)),
        single => predicate(single),
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    if op == CompareOp::Eq {
        return left.loose_eq(right);
    }

    let Some(ordering) = left
        .compare(right)
        .or_else(|| left.cmp_numeric(right))
    else {
        return false;
    };

    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
    }
}

// LIKE with boundary wildcards only, which is all the vocabulary emits.
fn like_match(text: &str, pattern: &str) -> bool {
    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%') && pattern.len() > 1;
    let mut needle = pattern;
    if leading {
        needle = &needle[1..];
    }
    if trailing {
        needle = &needle[..needle.len() - 1];
    }

    match (leading, trailing) {
        (true, true) => text.contains(needle),
        (true, false) => text.ends_with(needle),
        (false, true) => text.starts_with(needle),
        (false, false) => text == needle,
    }
}
