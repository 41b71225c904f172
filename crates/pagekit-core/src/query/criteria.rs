
use crate::model::{AttributeKind, EnumStorage, ScalarKind};
use crate::query::dialect::DialectProfile;
use crate::query::expr::{CompareOp, Expr, Restriction};
use crate::query::params::ParamBuilder;
use crate::value::{TextMode, Value};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

///
/// Criteria vocabulary
///
/// Immutable, value-typed filter wrappers. Each exposes two contracts:
/// `build` emits a backend restriction against a resolved path, and
/// `applies` is its literal in-memory counterpart, used for unit testing
/// and for post-filtering postponed-fetched collections.
///

///
/// CriteriaError
///

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    #[error("cannot parse `{value}` as {target}")]
    Unparseable { value: String, target: String },

    #[error("criteria value must not be null")]
    NullValue,

    #[error("IN criteria requires at least one item (field `{field}`)")]
    EmptyIn { field: String },
}

///
/// BuildContext
///
/// Everything predicate synthesis needs: the resolved path expression,
/// the nominal attribute kind, the query-scoped parameter builder, and
/// the dialect capability profile.
///

pub struct BuildContext<'a> {
    pub path: Expr,
    pub kind: AttributeKind,
    pub params: &'a mut ParamBuilder,
    pub dialect: &'a DialectProfile,
}

impl BuildContext<'_> {
    /// Scalar shape of the target path, when it has one.
    #[must_use]
    pub const fn scalar_kind(&self) -> Option<ScalarKind> {
        match self.kind {
            AttributeKind::Scalar(kind) | AttributeKind::ElementCollection(kind) => Some(kind),
            _ => None,
        }
    }

    const fn is_numeric_target(&self) -> bool {
        match self.scalar_kind() {
            Some(kind) => kind.is_numeric(),
            None => false,
        }
    }
}

///
/// LikeMode
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum LikeMode {
    StartsWith,
    EndsWith,
    Contains,
}

///
/// Like
///
/// Case-insensitive pattern search. The full value wraps as `v%`, `%v`,
/// or `%v%` depending on the mode.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Like {
    mode: LikeMode,
    value: String,
}

impl Like {
    #[must_use]
    pub fn starts_with(value: impl Into<String>) -> Self {
        Self {
            mode: LikeMode::StartsWith,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn ends_with(value: impl Into<String>) -> Self {
        Self {
            mode: LikeMode::EndsWith,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            mode: LikeMode::Contains,
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> LikeMode {
        self.mode
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The SQL pattern for this search.
    #[must_use]
    pub fn pattern(&self) -> String {
        match self.mode {
            LikeMode::StartsWith => format!("{}%", self.value),
            LikeMode::EndsWith => format!("%{}", self.value),
            LikeMode::Contains => format!("%{}%", self.value),
        }
    }

    fn matches(&self, text: &Value) -> bool {
        let result = match self.mode {
            LikeMode::StartsWith => text.text_starts_with(&self.value, TextMode::Ci),
            LikeMode::EndsWith => text.text_ends_with(&self.value, TextMode::Ci),
            LikeMode::Contains => text.text_contains(&self.value, TextMode::Ci),
        };

        result.unwrap_or(false)
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        match ctx.kind {
            // Ordinal enums have no textual column to search; select the
            // constants whose names match and compare ordinals instead.
            AttributeKind::Enum(model) if model.storage == EnumStorage::Ordinal => {
                let ordinals: Vec<Expr> = model
                    .constants
                    .iter()
                    .enumerate()
                    .filter(|(_, name)| self.matches(&Value::Enum((**name).to_string())))
                    .map(|(ordinal, _)| Expr::Literal(Value::Int(ordinal as i64)))
                    .collect();

                if ordinals.is_empty() {
                    return Some(Restriction::AlwaysFalse);
                }

                Some(Restriction::In {
                    expr: ctx.path.clone(),
                    items: ordinals,
                })
            }
            AttributeKind::Scalar(ScalarKind::Bool) => {
                match Value::Text(self.value.clone()).truthy() {
                    Some(true) => Some(Restriction::IsTrue(ctx.path.clone())),
                    Some(false) => Some(Restriction::IsFalse(ctx.path.clone())),
                    None => Some(Restriction::AlwaysFalse),
                }
            }
            _ => {
                let cast = ctx.dialect.cast_as_text(ctx.path.clone(), ctx.scalar_kind());
                let pattern = ctx.params.create(Value::Text(self.pattern()));

                // Numeric renderings have no case to fold.
                if ctx.is_numeric_target() {
                    Some(Restriction::Like {
                        expr: cast,
                        pattern,
                    })
                } else {
                    Some(Restriction::Like {
                        expr: cast.lower(),
                        pattern: pattern.lower(),
                    })
                }
            }
        }
    }
}

///
/// Between
///
/// Closed interval.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Between {
    min: Value,
    max: Value,
}

impl Between {
    #[must_use]
    pub fn new(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        let lower = value.compare(&self.min);
        let upper = value.compare(&self.max);

        matches!(lower, Some(Ordering::Greater | Ordering::Equal))
            && matches!(upper, Some(Ordering::Less | Ordering::Equal))
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        if self.min.is_null() || self.max.is_null() {
            return None;
        }

        Some(Restriction::Between {
            expr: ctx.path.clone(),
            lo: ctx.params.create(self.min.clone()),
            hi: ctx.params.create(self.max.clone()),
        })
    }
}

///
/// OrderOp
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl OrderOp {
    const fn compare_op(self) -> CompareOp {
        match self {
            Self::Lt => CompareOp::Lt,
            Self::Lte => CompareOp::Lte,
            Self::Gt => CompareOp::Gt,
            Self::Gte => CompareOp::Gte,
        }
    }
}

///
/// Order
///
/// One-sided typed comparison.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Order {
    op: OrderOp,
    value: Value,
}

impl Order {
    #[must_use]
    pub fn lt(value: impl Into<Value>) -> Self {
        Self {
            op: OrderOp::Lt,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn lte(value: impl Into<Value>) -> Self {
        Self {
            op: OrderOp::Lte,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn gt(value: impl Into<Value>) -> Self {
        Self {
            op: OrderOp::Gt,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn gte(value: impl Into<Value>) -> Self {
        Self {
            op: OrderOp::Gte,
            value: value.into(),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        let Some(ordering) = value.compare(&self.value) else {
            return false;
        };

        match self.op {
            OrderOp::Lt => ordering == Ordering::Less,
            OrderOp::Lte => ordering != Ordering::Greater,
            OrderOp::Gt => ordering == Ordering::Greater,
            OrderOp::Gte => ordering != Ordering::Less,
        }
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        if self.value.is_null() {
            return None;
        }

        Some(Restriction::Compare {
            left: ctx.path.clone(),
            op: self.op.compare_op(),
            right: ctx.params.create(self.value.clone()),
        })
    }
}

///
/// IgnoreCase
///
/// Exact case-insensitive equality.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IgnoreCase {
    value: String,
}

impl IgnoreCase {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        value.text_eq(&self.value, TextMode::Ci).unwrap_or(false)
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        let cast = ctx.dialect.cast_as_text(ctx.path.clone(), ctx.scalar_kind());
        let param = ctx.params.create(Value::Text(self.value.clone()));

        Some(Restriction::eq(cast.lower(), param.lower()))
    }
}

///
/// Enumerated
///
/// Equality against an enum constant, parsed case-insensitively by name
/// when the input is textual.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Enumerated {
    value: Value,
}

impl Enumerated {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Strict constructor: fails when the input cannot name a constant of
    /// the target enum.
    pub fn parse(
        value: impl Into<Value>,
        model: &'static crate::model::EnumModel,
    ) -> Result<Self, CriteriaError> {
        let value = value.into();
        let resolved = value.to_text().and_then(|text| model.resolve(&text));

        match resolved {
            Some(constant) => Ok(Self {
                value: Value::Enum(constant.to_string()),
            }),
            None => Err(CriteriaError::Unparseable {
                value: value.to_string(),
                target: model.name.to_string(),
            }),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        let Some(expected) = self.value.to_text() else {
            return false;
        };

        value.text_eq(&expected, TextMode::Ci).unwrap_or(false)
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        match ctx.kind {
            AttributeKind::Enum(model) => {
                let constant = self.value.to_text().and_then(|text| model.resolve(&text))?;
                let bound = match model.storage {
                    EnumStorage::Ordinal => {
                        Value::Int(model.ordinal(constant).unwrap_or_default() as i64)
                    }
                    EnumStorage::Name => Value::Enum(constant.to_string()),
                };

                Some(Restriction::eq(ctx.path.clone(), ctx.params.create(bound)))
            }
            _ => Some(Restriction::eq(
                ctx.path.clone(),
                ctx.params.create(self.value.clone()),
            )),
        }
    }
}

///
/// Numeric
///
/// Equality after parsing the input with respect to the target
/// attribute's numeric type.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Numeric {
    value: Value,
}

impl Numeric {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Parse an input value to the numeric shape of the target attribute.
    pub fn parse(value: &Value, kind: ScalarKind) -> Result<Value, CriteriaError> {
        if value.is_null() {
            return Err(CriteriaError::NullValue);
        }

        let unparseable = || CriteriaError::Unparseable {
            value: value.to_string(),
            target: format!("{kind:?}"),
        };

        match kind {
            ScalarKind::Int32 => match value {
                Value::Int(n) if i32::try_from(*n).is_ok() => Ok(Value::Int(*n)),
                Value::Text(s) => s
                    .trim()
                    .parse::<i32>()
                    .map(|n| Value::Int(i64::from(n)))
                    .map_err(|_| unparseable()),
                _ => Err(unparseable()),
            },
            ScalarKind::Int64 => match value {
                Value::Int(n) => Ok(Value::Int(*n)),
                Value::IntBig(n) => i64::try_from(n).map(Value::Int).map_err(|_| unparseable()),
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| unparseable()),
                _ => Err(unparseable()),
            },
            ScalarKind::Decimal => match value {
                Value::Decimal(d) => Ok(Value::Decimal(*d)),
                Value::Int(n) => Ok(Value::Decimal(Decimal::from(*n))),
                Value::Text(s) => Decimal::from_str(s.trim())
                    .map(Value::Decimal)
                    .map_err(|_| unparseable()),
                _ => Err(unparseable()),
            },
            ScalarKind::IntBig => match value {
                Value::IntBig(n) => Ok(Value::IntBig(n.clone())),
                Value::Int(n) => Ok(Value::IntBig(BigInt::from(*n))),
                Value::Text(s) => BigInt::from_str(s.trim())
                    .map(Value::IntBig)
                    .map_err(|_| unparseable()),
                _ => Err(unparseable()),
            },
            _ => Err(unparseable()),
        }
    }

    fn applies(&self, value: &Value) -> bool {
        let (Some(left), Some(right)) = (numeric_repr(value), numeric_repr(&self.value)) else {
            return false;
        };

        left.cmp_numeric(&right) == Some(Ordering::Equal)
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Result<Option<Restriction>, CriteriaError> {
        if self.value.is_null() {
            return Ok(None);
        }

        let Some(kind) = ctx.scalar_kind().filter(|kind| kind.is_numeric()) else {
            return Err(CriteriaError::Unparseable {
                value: self.value.to_string(),
                target: "numeric attribute".to_string(),
            });
        };

        let parsed = Self::parse(&self.value, kind)?;

        Ok(Some(Restriction::eq(
            ctx.path.clone(),
            ctx.params.create(parsed),
        )))
    }
}

///
/// Bool
///
/// Equality after truthy parsing: accepts booleans, non-zero numbers, and
/// textual truthy forms.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bool {
    value: bool,
}

impl Bool {
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self { value }
    }

    /// Truthy-parsing constructor.
    pub fn parse(value: &Value) -> Result<Self, CriteriaError> {
        if value.is_null() {
            return Err(CriteriaError::NullValue);
        }

        value
            .truthy()
            .map(|value| Self { value })
            .ok_or_else(|| CriteriaError::Unparseable {
                value: value.to_string(),
                target: "bool".to_string(),
            })
    }

    fn applies(&self, value: &Value) -> bool {
        value.truthy() == Some(self.value)
    }

    fn build(&self, ctx: &mut BuildContext<'_>) -> Option<Restriction> {
        Some(Restriction::eq(
            ctx.path.clone(),
            ctx.params.create(Value::Bool(self.value)),
        ))
    }
}

///
/// Criteria
///
/// The criteria sum type. Only `Not` nests; every other combination is
/// unrepresentable by construction.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Criteria {
    Like(Like),
    Between(Between),
    Order(Order),
    IgnoreCase(IgnoreCase),
    Enumerated(Enumerated),
    Numeric(Numeric),
    Bool(Bool),
    Not(Box<Self>),
}

impl Criteria {
    /// Logical negation wrapper.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self::Not(Box::new(inner))
    }

    /// Unwrap one level of negation. Returns the inner criteria and
    /// whether a negation was removed.
    #[must_use]
    pub fn unwrap_not(&self) -> (&Self, bool) {
        match self {
            Self::Not(inner) => (inner, true),
            other => (other, false),
        }
    }

    /// True when the carried value is the null marker.
    #[must_use]
    pub fn carries_null(&self) -> bool {
        match self {
            Self::Like(_) | Self::IgnoreCase(_) | Self::Bool(_) => false,
            Self::Between(between) => between.min.is_null() && between.max.is_null(),
            Self::Order(order) => order.value.is_null(),
            Self::Enumerated(enumerated) => enumerated.value.is_null(),
            Self::Numeric(numeric) => numeric.value.is_null(),
            Self::Not(inner) => inner.carries_null(),
        }
    }

    /// In-memory counterpart of `build`.
    #[must_use]
    pub fn applies(&self, value: &Value) -> bool {
        match self {
            Self::Like(like) => like.matches(value),
            Self::Between(between) => between.applies(value),
            Self::Order(order) => order.applies(value),
            Self::IgnoreCase(ignore_case) => ignore_case.applies(value),
            Self::Enumerated(enumerated) => enumerated.applies(value),
            Self::Numeric(numeric) => numeric.applies(value),
            Self::Bool(truth) => truth.applies(value),
            Self::Not(inner) => !inner.applies(value),
        }
    }

    /// Emit the backend restriction for this criteria against the
    /// context's path. `Ok(None)` means the field is dropped.
    pub fn build(&self, ctx: &mut BuildContext<'_>) -> Result<Option<Restriction>, CriteriaError> {
        match self {
            Self::Like(like) => Ok(like.build(ctx)),
            Self::Between(between) => Ok(between.build(ctx)),
            Self::Order(order) => Ok(order.build(ctx)),
            Self::IgnoreCase(ignore_case) => Ok(ignore_case.build(ctx)),
            Self::Enumerated(enumerated) => Ok(enumerated.build(ctx)),
            Self::Numeric(numeric) => numeric.build(ctx),
            Self::Bool(truth) => Ok(truth.build(ctx)),
            Self::Not(inner) => {
                let built = inner.build(ctx)?;
                Ok(built.map(Restriction::negate))
            }
        }
    }
}

impl From<Like> for Criteria {
    fn from(value: Like) -> Self {
        Self::Like(value)
    }
}

impl From<Between> for Criteria {
    fn from(value: Between) -> Self {
        Self::Between(value)
    }
}

impl From<Order> for Criteria {
    fn from(value: Order) -> Self {
        Self::Order(value)
    }
}

impl From<IgnoreCase> for Criteria {
    fn from(value: IgnoreCase) -> Self {
        Self::IgnoreCase(value)
    }
}

impl From<Enumerated> for Criteria {
    fn from(value: Enumerated) -> Self {
        Self::Enumerated(value)
    }
}

impl From<Numeric> for Criteria {
    fn from(value: Numeric) -> Self {
        Self::Numeric(value)
    }
}

impl From<Bool> for Criteria {
    fn from(value: Bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Like(like) => {
                let label = match like.mode {
                    LikeMode::StartsWith => "starts_with",
                    LikeMode::EndsWith => "ends_with",
                    LikeMode::Contains => "contains",
                };
                write!(f, "{label}({})", like.value)
            }
            Self::Between(between) => write!(f, "between({}, {})", between.min, between.max),
            Self::Order(order) => {
                let label = match order.op {
                    OrderOp::Lt => "lt",
                    OrderOp::Lte => "lte",
                    OrderOp::Gt => "gt",
                    OrderOp::Gte => "gte",
                };
                write!(f, "{label}({})", order.value)
            }
            Self::IgnoreCase(ignore_case) => write!(f, "ignore_case({})", ignore_case.value),
            Self::Enumerated(enumerated) => write!(f, "enumerated({})", enumerated.value),
            Self::Numeric(numeric) => write!(f, "numeric({})", numeric.value),
            Self::Bool(truth) => write!(f, "bool({})", truth.value),
            Self::Not(inner) => write!(f, "not({inner})"),
        }
    }
}

// Numeric reading of a value for in-memory equality: numbers as-is,
// text parsed in order of specificity.
fn numeric_repr(value: &Value) -> Option<Value> {
    match value {
        Value::Int(_) | Value::Decimal(_) | Value::IntBig(_) => Some(value.clone()),
        Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Some(Value::Int(n));
            }
            if let Ok(d) = Decimal::from_str(trimmed) {
                return Some(Value::Decimal(d));
            }
            BigInt::from_str(trimmed).ok().map(Value::IntBig)
        }
        _ => None,
    }
}
