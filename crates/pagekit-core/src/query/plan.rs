use crate::query::dialect::CountSubqueryShape;
use crate::query::expr::{Expr, Restriction};
use crate::query::select::Selection;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Structured query IR
///
/// The engine emits these records instead of driving a builder API; a
/// backend interprets them (SQL rendering, in-memory evaluation) in its
/// own pass. Scratch state, owned by one `get_page` invocation.
///

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

///
/// FetchMode
///
/// How the root handles fetch requests; the tagged replacement for the
/// source's per-backend root wrapper hierarchy.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchMode {
    /// Range plus fetch-join paginates correctly: emit a fetch join.
    Direct,
    /// Emit no join; register a per-fetch batch hint instead.
    Batch,
    /// Emit no join; set the fetch aside for a secondary query.
    Secondary,
}

///
/// JoinSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinSpec {
    pub field: String,
    pub alias: String,
    pub fetch: bool,
}

/// Hint prefix for batch-mode postponed fetches.
pub const BATCH_FETCH_HINT: &str = "pagekit.fetch.batch";

/// Hint carrying the cache region key (the request fingerprint).
pub const CACHE_REGION_HINT: &str = "pagekit.cache.region";

/// Hint marking the query as cacheable; the relational layer decides.
pub const CACHEABLE_HINT: &str = "pagekit.cacheable";

///
/// SelectQuery
///

#[derive(Clone, Debug)]
pub struct SelectQuery {
    pub entity: &'static str,
    pub distinct: bool,
    pub selection: Selection,
    pub joins: Vec<JoinSpec>,
    pub restriction: Option<Restriction>,
    pub group_by_root: bool,
    pub having: Option<Restriction>,
    pub order: Vec<(Expr, OrderDirection)>,
    pub params: BTreeMap<String, Value>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub hints: BTreeMap<String, String>,
    /// Fetch paths set aside for secondary-query resolution.
    pub postponed: Vec<String>,
    fetch_mode: FetchMode,
}

impl SelectQuery {
    #[must_use]
    pub const fn new(entity: &'static str, fetch_mode: FetchMode) -> Self {
        Self {
            entity,
            distinct: false,
            selection: Selection::Root,
            joins: Vec::new(),
            restriction: None,
            group_by_root: false,
            having: None,
            order: Vec::new(),
            params: BTreeMap::new(),
            offset: None,
            limit: None,
            hints: BTreeMap::new(),
            postponed: Vec::new(),
            fetch_mode,
        }
    }

    #[must_use]
    pub const fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Request an eager fetch of a relation. The effect depends on the
    /// backend's fetch mode: a fetch join, a batch hint, or a postponed
    /// secondary query.
    pub fn fetch(&mut self, field: impl Into<String>) {
        let field = field.into();
        match self.fetch_mode {
            FetchMode::Direct => {
                let alias = field.clone();
                self.joins.push(JoinSpec {
                    field,
                    alias,
                    fetch: true,
                });
            }
            FetchMode::Batch => {
                self.hints
                    .insert(format!("{BATCH_FETCH_HINT}.{field}"), "true".to_string());
                self.postponed.push(field);
            }
            FetchMode::Secondary => {
                self.postponed.push(field);
            }
        }
    }

    /// Add a plain (non-fetching) join.
    pub fn join(&mut self, field: impl Into<String>) {
        let field = field.into();
        let alias = field.clone();
        self.joins.push(JoinSpec {
            field,
            alias,
            fetch: false,
        });
    }

    /// Conjoin a restriction with whatever is already present.
    pub fn restrict(&mut self, restriction: Restriction) {
        self.restriction = match self.restriction.take() {
            Some(existing) => Some(Restriction::And(vec![existing, restriction])),
            None => Some(restriction),
        };
    }

    pub fn hint(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.hints.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    #[must_use]
    pub fn has_fetch_joins(&self) -> bool {
        self.joins.iter().any(|join| join.fetch)
    }

    /// True when the query carries any restriction, group, or having
    /// clause; drives count-subquery emission.
    #[must_use]
    pub const fn has_restrictions(&self) -> bool {
        self.restriction.is_some() || self.group_by_root || self.having.is_some()
    }
}

///
/// CountQuery
///
/// `SELECT COUNT(root) FROM entity root`, optionally constrained by an
/// inner subquery carrying the main query's restrictions. Parameter
/// bindings flow from the subquery into the outer count query.
///

#[derive(Clone, Debug)]
pub struct CountQuery {
    pub entity: &'static str,
    pub shape: CountSubqueryShape,
    pub sub: Option<Box<SelectQuery>>,
}

impl CountQuery {
    /// Parameter bindings visible to the outer query.
    #[must_use]
    pub fn params(&self) -> BTreeMap<String, Value> {
        self.sub
            .as_ref()
            .map(|sub| sub.params.clone())
            .unwrap_or_default()
    }
}

///
/// FetchQuery
///
/// Secondary query materializing one postponed fetch path:
/// `SELECT DISTINCT e FROM entity e JOIN FETCH e.{path} WHERE e.id IN (:ids)`.
///

#[derive(Clone, Debug)]
pub struct FetchQuery {
    pub entity: &'static str,
    pub path: String,
    pub ids: Vec<Value>,
}
