use crate::error::PageError;
use crate::model::{AttributeKind, ScalarKind};
use crate::query::alias::Alias;
use crate::query::criteria::{
    Bool, BuildContext, Criteria, Enumerated, IgnoreCase, Numeric,
};
use crate::query::dialect::DialectProfile;
use crate::query::expr::{AggregateKind, Expr, Restriction, TaggedRestriction};
use crate::query::params::ParamBuilder;
use crate::query::paths::PathError;
use crate::query::request::{FilterValue, PageRequest};
use crate::query::select::FieldResolver;
use crate::value::Value;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// Restriction builder
///
/// Walks the required and optional criteria maps in insertion order,
/// dispatches each entry to the criteria vocabulary, partitions the
/// synthesized predicates by alias class, and assembles the final WHERE
/// and HAVING trees. Filter input is user-controlled and tolerant:
/// unknown and unparseable fields are dropped; everything else is strict.
///

///
/// RestrictionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RestrictionError {
    #[error("unsupported criteria value for field `{field}`")]
    UnsupportedCriteria { field: String },
}

///
/// CriteriaFallback
///
/// Overridable hook consulted before an unsupported value/path
/// combination becomes fatal.
///

pub trait CriteriaFallback {
    fn build(
        &self,
        field: &str,
        value: &Value,
        ctx: &mut BuildContext<'_>,
    ) -> Option<Restriction>;
}

///
/// RestrictionOutcome
///

#[derive(Debug, Default)]
pub struct RestrictionOutcome {
    pub restriction: Option<Restriction>,
    pub having: Option<Restriction>,
    /// Set when a HAVING or an IN-with-count predicate was emitted; both
    /// force a GROUP BY on the root.
    pub group_by_root: bool,
    pub params: BTreeMap<String, Value>,
}

/// Walk both criteria maps and assemble the query restrictions.
///
/// `existing` is a pre-existing restriction installed by the caller's
/// query customizer; it is conjoined with the required conjunction.
pub fn build_restrictions(
    request: &PageRequest,
    resolver: &mut FieldResolver<'_>,
    profile: &DialectProfile,
    existing: Option<Restriction>,
    fallback: Option<&dyn CriteriaFallback>,
) -> Result<RestrictionOutcome, PageError> {
    let mut params = BTreeMap::new();

    let mut required = Vec::new();
    for (field, value) in request.required() {
        if let Some(tagged) =
            build_field(field, value, resolver, profile, fallback, &mut params)?
        {
            required.push(tagged);
        }
    }

    let mut optional = Vec::new();
    for (field, value) in request.optional() {
        if let Some(tagged) =
            build_field(field, value, resolver, profile, fallback, &mut params)?
        {
            optional.push(tagged);
        }
    }

    // IN predicates over more than one item additionally demand that the
    // join matches every item, not any: COUNT(DISTINCT join) = count.
    let mut having_parts = Vec::new();
    for tagged in &required {
        if let Some((_, count)) = tagged.alias.field_and_count()
            && count > 1
            && let Restriction::In { expr, .. } = &tagged.restriction
        {
            let companion = Restriction::Compare {
                left: Expr::aggregate(AggregateKind::CountDistinct, expr.clone()),
                op: crate::query::expr::CompareOp::Eq,
                right: Expr::Literal(Value::Int(count as i64)),
            };
            having_parts.push(TaggedRestriction::new(
                companion,
                tagged.alias.as_having_count(),
            ));
        }
    }

    let any_in = required
        .iter()
        .chain(optional.iter())
        .any(|tagged| tagged.alias.is_in());

    let (required_where, required_having) = partition(required);
    let (optional_where, optional_having) = partition(optional);

    let mut where_parts: Vec<Restriction> = Vec::new();
    if let Some(existing) = existing {
        where_parts.push(existing);
    }
    where_parts.extend(required_where);
    if let Some(any) = Restriction::or(optional_where) {
        where_parts.push(any);
    }

    let mut having_all: Vec<Restriction> =
        having_parts.into_iter().map(|t| t.restriction).collect();
    having_all.extend(required_having);
    if let Some(any) = Restriction::or(optional_having) {
        having_all.push(any);
    }

    let having = Restriction::and(having_all);
    let group_by_root = having.is_some() || any_in;

    Ok(RestrictionOutcome {
        restriction: Restriction::and(where_parts),
        having,
        group_by_root,
        params,
    })
}

// Split a synthesized batch into WHERE-class and HAVING-class trees.
fn partition(tagged: Vec<TaggedRestriction>) -> (Vec<Restriction>, Vec<Restriction>) {
    let mut where_parts = Vec::new();
    let mut having_parts = Vec::new();
    for t in tagged {
        if t.alias.is_having() {
            having_parts.push(t.restriction);
        } else {
            where_parts.push(t.restriction);
        }
    }

    (where_parts, having_parts)
}

// Synthesize one criteria-map entry into a tagged predicate.
//
// Returns `Ok(None)` when the field is dropped: unknown field, null-free
// unresolvable enum/number, or empty IN list.
fn build_field(
    field: &str,
    value: &FilterValue,
    resolver: &mut FieldResolver<'_>,
    profile: &DialectProfile,
    fallback: Option<&dyn CriteriaFallback>,
    params_out: &mut BTreeMap<String, Value>,
) -> Result<Option<TaggedRestriction>, PageError> {
    let expr = match resolver.resolve(field) {
        Ok(expr) => expr,
        Err(PathError::UnknownField { .. }) => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let kind = nominal_kind(&expr);
    let aggregated = expr.is_aggregation();
    let mut alias = Alias::classify(aggregated, field);

    // Element-collection predicates target the shared join alias, not the
    // collection attribute itself.
    let is_element = resolver
        .paths()
        .relations()
        .element_collections
        .contains(field);
    let expr = if is_element {
        Expr::Path(resolver.paths().element_join(field)?)
    } else {
        expr
    };

    let (value, negated) = match value {
        FilterValue::Criteria(criteria) => {
            let (inner, negated) = criteria.unwrap_not();
            (FilterValue::Criteria(inner.clone()), negated)
        }
        other => (other.clone(), false),
    };

    let mut params = ParamBuilder::new(field);
    let mut ctx = BuildContext {
        path: expr,
        kind,
        params: &mut params,
        dialect: profile,
    };

    let restriction = if value.is_null() {
        Some(Restriction::IsNull(ctx.path.clone()))
    } else if is_element && !matches!(value, FilterValue::Criteria(_)) {
        match element_in(field, &value, &mut ctx) {
            Ok(restriction) => {
                if let Some(Restriction::In { items, .. }) = &restriction {
                    alias = alias.with_in_count(items.len());
                }
                restriction
            }
            // Empty IN lists drop the field; filter input is tolerant.
            Err(_) => None,
        }
    } else {
        match dispatch(field, &value, &mut ctx, fallback) {
            Ok(restriction) => restriction,
            Err(PageError::Criteria(_)) => None,
            Err(err) => return Err(err),
        }
    };

    params_out.append(&mut params.into_bindings());

    Ok(restriction.map(|r| {
        let r = if negated { r.negate() } else { r };
        TaggedRestriction::new(r, alias)
    }))
}

// Nominal attribute kind of a resolved expression. Projection-mapped
// expressions have no declared path type; aggregations read as numbers,
// anything else as text.
fn nominal_kind(expr: &Expr) -> AttributeKind {
    expr.path().map_or_else(
        || {
            if expr.is_aggregation() {
                AttributeKind::Scalar(ScalarKind::Int64)
            } else {
                AttributeKind::Scalar(ScalarKind::Text)
            }
        },
        |path| path.kind,
    )
}

// IN over the parameterized items of an element-collection entry.
fn element_in(
    field: &str,
    value: &FilterValue,
    ctx: &mut BuildContext<'_>,
) -> Result<Option<Restriction>, PageError> {
    let items = match value {
        FilterValue::Values(items) => items.clone(),
        FilterValue::Value(Value::List(items)) => items.clone(),
        FilterValue::Value(single) => vec![single.clone()],
        // Criteria entries are dispatched to the vocabulary instead.
        FilterValue::Criteria(_) => return Ok(None),
    };

    if items.is_empty() {
        return Err(crate::query::criteria::CriteriaError::EmptyIn {
            field: field.to_string(),
        }
        .into());
    }

    let items = items
        .into_iter()
        .map(|item| ctx.params.create(item))
        .collect();

    Ok(Some(Restriction::In {
        expr: ctx.path.clone(),
        items,
    }))
}

// Dispatch one entry by value kind and path type.
fn dispatch(
    field: &str,
    value: &FilterValue,
    ctx: &mut BuildContext<'_>,
    fallback: Option<&dyn CriteriaFallback>,
) -> Result<Option<Restriction>, PageError> {
    match value {
        FilterValue::Criteria(criteria) => Ok(criteria.build(ctx)?),

        // A sequence means "equals any of": fold into a disjunction of
        // per-item predicates.
        FilterValue::Values(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(part) =
                    dispatch(field, &FilterValue::Value(item.clone()), ctx, fallback)?
                {
                    parts.push(part);
                }
            }

            Ok(Restriction::or(parts))
        }

        FilterValue::Value(item) => dispatch_value(field, item, ctx, fallback),
    }
}

fn dispatch_value(
    field: &str,
    value: &Value,
    ctx: &mut BuildContext<'_>,
    fallback: Option<&dyn CriteriaFallback>,
) -> Result<Option<Restriction>, PageError> {
    match ctx.kind {
        AttributeKind::Enum(model) => {
            let criteria = Enumerated::parse(value.clone(), model)?;
            Ok(Criteria::Enumerated(criteria).build(ctx)?)
        }
        AttributeKind::Scalar(kind) | AttributeKind::ElementCollection(kind)
            if kind.is_numeric() =>
        {
            let parsed = Numeric::parse(value, kind)?;
            Ok(Some(Restriction::eq(
                ctx.path.clone(),
                ctx.params.create(parsed),
            )))
        }
        AttributeKind::Scalar(ScalarKind::Bool) => {
            let criteria = Bool::parse(value)?;
            Ok(Criteria::Bool(criteria).build(ctx)?)
        }
        AttributeKind::Scalar(ScalarKind::Text)
        | AttributeKind::ElementCollection(ScalarKind::Text) => {
            ignore_case_of(value, ctx)
        }
        _ if matches!(value, Value::Text(_)) => ignore_case_of(value, ctx),
        _ => {
            if let Some(hook) = fallback
                && let Some(restriction) = hook.build(field, value, ctx)
            {
                return Ok(Some(restriction));
            }

            Err(RestrictionError::UnsupportedCriteria {
                field: field.to_string(),
            }
            .into())
        }
    }
}

// String targets and string inputs default to case-insensitive equality.
fn ignore_case_of(
    value: &Value,
    ctx: &mut BuildContext<'_>,
) -> Result<Option<Restriction>, PageError> {
    let Some(text) = value.to_text() else {
        return Ok(None);
    };

    Ok(Criteria::IgnoreCase(IgnoreCase::new(text)).build(ctx)?)
}
