use crate::model::ScalarKind;
use crate::query::expr::Expr;

///
/// Dialect capability profile
///
/// All backend variability the core depends on, injected explicitly at
/// construction. There is no provider or dialect sniffing; an adapter for
/// each backend fills in these flags.
///

///
/// StringCastPolicy
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StringCastPolicy {
    /// The dialect casts implicitly; pass expressions through unchanged.
    Lenient,
    /// The dialect refuses implicit casts for numeric and temporal
    /// targets; emit `TO_CHAR(expr, pattern)`.
    Explicit,
}

///
/// CountSubqueryShape
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CountSubqueryShape {
    /// `WHERE root IN (SELECT sub FROM entity sub WHERE ...)`
    RootIn,
    /// `WHERE root.id IN (SELECT sub.id FROM entity sub WHERE ...)`
    IdIn,
    /// `WHERE EXISTS (SELECT 1 FROM entity sub WHERE ... AND sub.id = root.id)`
    Exists,
}

///
/// PostponedFetchKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PostponedFetchKind {
    /// Range plus fetch-join paginates correctly; fetch directly.
    None,
    /// Needs a per-fetch batch hint on the main query.
    Batch,
    /// Needs a secondary query per fetch path with a manual in-memory
    /// join, filter, and sort.
    Secondary,
}

///
/// DialectProfile
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DialectProfile {
    pub string_cast: StringCastPolicy,
    pub count_shape: CountSubqueryShape,
    pub postponed_fetch: PostponedFetchKind,
}

impl DialectProfile {
    /// A fully-capable backend: implicit casts, row-valued IN, native
    /// range-plus-fetch pagination.
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            string_cast: StringCastPolicy::Lenient,
            count_shape: CountSubqueryShape::RootIn,
            postponed_fetch: PostponedFetchKind::None,
        }
    }

    /// A restricted backend: explicit casts, id-valued IN, secondary-query
    /// postponed fetches.
    #[must_use]
    pub const fn restricted() -> Self {
        Self {
            string_cast: StringCastPolicy::Explicit,
            count_shape: CountSubqueryShape::IdIn,
            postponed_fetch: PostponedFetchKind::Secondary,
        }
    }

    /// Apply the dialect-correct string cast to an expression of the given
    /// scalar shape.
    #[must_use]
    pub fn cast_as_text(&self, expr: Expr, kind: Option<ScalarKind>) -> Expr {
        let pattern = match (self.string_cast, kind) {
            (StringCastPolicy::Explicit, Some(kind)) => cast_pattern(kind),
            _ => None,
        };

        Expr::CastText {
            inner: Box::new(expr),
            pattern,
        }
    }
}

impl Default for DialectProfile {
    fn default() -> Self {
        Self::lenient()
    }
}

/// `TO_CHAR` conversion pattern per scalar shape. Only numeric and
/// temporal targets need one; textual shapes cast implicitly everywhere.
#[must_use]
pub const fn cast_pattern(kind: ScalarKind) -> Option<&'static str> {
    match kind {
        ScalarKind::Int32 | ScalarKind::Int64 | ScalarKind::IntBig => {
            Some("FM999999999999999999")
        }
        ScalarKind::Decimal => Some("FM999999999999999999.999999999"),
        ScalarKind::Date => Some("YYYY-MM-DD"),
        ScalarKind::Time => Some("HH24:MI:SS"),
        ScalarKind::DateTime => Some("YYYY-MM-DD\"T\"HH24:MI:SS\"Z\""),
        ScalarKind::DateTimeTz => Some("YYYY-MM-DD\"T\"HH24:MI:SSOF"),
        ScalarKind::Bool | ScalarKind::Text => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn lenient_dialects_pass_through_without_a_pattern() {
        let profile = DialectProfile::lenient();
        let cast = profile.cast_as_text(Expr::Literal(Value::Int(7)), Some(ScalarKind::Int64));

        let Expr::CastText { pattern, .. } = cast else {
            panic!("expected a cast expression");
        };
        assert_eq!(pattern, None);
    }

    #[test]
    fn explicit_dialects_emit_per_type_patterns() {
        let profile = DialectProfile::restricted();
        let cast = profile.cast_as_text(Expr::Literal(Value::Int(7)), Some(ScalarKind::Date));

        let Expr::CastText { pattern, .. } = cast else {
            panic!("expected a cast expression");
        };
        assert_eq!(pattern, Some("YYYY-MM-DD"));
    }

    #[test]
    fn textual_targets_never_need_a_pattern() {
        assert_eq!(cast_pattern(ScalarKind::Text), None);
        assert_eq!(cast_pattern(ScalarKind::Bool), None);
        assert!(cast_pattern(ScalarKind::DateTimeTz).unwrap().contains("OF"));
    }
}
