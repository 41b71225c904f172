
use std::fmt;

///
/// Alias
///
/// Structural tag attached to every synthesized predicate. The record is
/// the in-memory representation; the lexical string form
/// `{class}_{field-with-dots-as-$}[_<count>_in]` exists only at the
/// backend boundary and round-trips through `encode`/`parse`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alias {
    pub kind: AliasKind,
    pub field: String,
    pub in_count: Option<usize>,
}

///
/// AliasKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AliasKind {
    Where,
    Having,
}

impl fmt::Display for AliasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Where => "where",
            Self::Having => "having",
        };
        write!(f, "{label}")
    }
}

impl Alias {
    #[must_use]
    pub fn new(kind: AliasKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            in_count: None,
        }
    }

    /// Classify a predicate alias: `Having` when the resolved expression
    /// is an aggregation of the path, `Where` otherwise.
    #[must_use]
    pub fn classify(aggregated: bool, field: impl Into<String>) -> Self {
        let kind = if aggregated {
            AliasKind::Having
        } else {
            AliasKind::Where
        };

        Self::new(kind, field)
    }

    /// Mark this alias as an IN predicate over `count` items.
    #[must_use]
    pub const fn with_in_count(mut self, count: usize) -> Self {
        self.in_count = Some(count);
        self
    }

    /// Alias for the companion `COUNT(DISTINCT join) = count` predicate of
    /// an IN-marked alias.
    #[must_use]
    pub fn as_having_count(&self) -> Self {
        Self::new(AliasKind::Having, self.field.clone())
    }

    /// Field path and encoded item count of an IN-marked alias.
    #[must_use]
    pub fn field_and_count(&self) -> Option<(&str, usize)> {
        self.in_count.map(|count| (self.field.as_str(), count))
    }

    #[must_use]
    pub const fn is_where(&self) -> bool {
        matches!(self.kind, AliasKind::Where)
    }

    #[must_use]
    pub const fn is_having(&self) -> bool {
        matches!(self.kind, AliasKind::Having)
    }

    /// IN-marked aliases are always WHERE-class.
    #[must_use]
    pub const fn is_in(&self) -> bool {
        self.in_count.is_some()
    }

    /// Lexical form for backend interoperability. Dots are reserved as
    /// structural separators, so field dots encode as `$`.
    #[must_use]
    pub fn encode(&self) -> String {
        let field = self.field.replace('.', "$");
        match self.in_count {
            Some(count) => format!("{}_{field}_{count}_in", self.kind),
            None => format!("{}_{field}", self.kind),
        }
    }

    /// Inverse of `encode`.
    #[must_use]
    pub fn parse(alias: &str) -> Option<Self> {
        let (kind, rest) = if let Some(rest) = alias.strip_prefix("where_") {
            (AliasKind::Where, rest)
        } else if let Some(rest) = alias.strip_prefix("having_") {
            (AliasKind::Having, rest)
        } else {
            return None;
        };

        let (field, in_count) = match rest.strip_suffix("_in") {
            Some(prefix) => {
                let (field, count) = prefix.rsplit_once('_')?;
                (field, Some(count.parse().ok()?))
            }
            None => (rest, None),
        };

        if field.is_empty() {
            return None;
        }

        Some(Self {
            kind,
            field: field.replace('$', "."),
            in_count,
        })
    }
}
