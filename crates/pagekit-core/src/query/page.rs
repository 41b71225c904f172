#[cfg(test)]
mod tests;

use crate::error::PageError;
use crate::query::backend::Backend;
use crate::query::dialect::PostponedFetchKind;
use crate::query::expr::Expr;
use crate::query::order::build_order;
use crate::query::paths::PathResolver;
use crate::query::plan::{
    CACHE_REGION_HINT, CACHEABLE_HINT, CountQuery, FetchMode, FetchQuery, JoinSpec,
    OrderDirection, SelectQuery,
};
use crate::query::request::{PageRequest, UNBOUNDED};
use crate::query::restrict::{CriteriaFallback, build_restrictions};
use crate::query::select::{FieldResolver, plan_selection};
use crate::response::{Page, UNKNOWN_TOTAL};
use crate::traits::EntityKind;
use crate::value::Value;
use crate::{page_trace_page, page_trace_query};
use std::cmp::Ordering;
use std::marker::PhantomData;

///
/// PageHooks
///
/// Page lifecycle callbacks with no-op defaults. `on_page` receives the
/// cache region key (the request fingerprint) before the queries run.
///

pub trait PageHooks {
    fn before_page(&self) {}
    fn on_page(&self, _page_key: &str, _cacheable: bool) {}
    fn after_page(&self) {}
}

///
/// NoHooks
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl PageHooks for NoHooks {}

///
/// Pager
///
/// Top-level paging engine. Stateless across invocations; all scratch
/// state (resolver cache, parameter bindings, recorded postponed fetches)
/// lives for the duration of one `get_page` call.
///

pub struct Pager<E, B, H = NoHooks> {
    backend: B,
    hooks: H,
    fallback: Option<Box<dyn CriteriaFallback>>,
    _marker: PhantomData<E>,
}

impl<E, B> Pager<E, B>
where
    E: EntityKind,
    B: Backend<E>,
{
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            hooks: NoHooks,
            fallback: None,
            _marker: PhantomData,
        }
    }
}

impl<E, B, H> Pager<E, B, H>
where
    E: EntityKind,
    B: Backend<E>,
    H: PageHooks,
{
    /// Replace the lifecycle hooks.
    #[must_use]
    pub fn with_hooks<H2: PageHooks>(self, hooks: H2) -> Pager<E, B, H2> {
        Pager {
            backend: self.backend,
            hooks,
            fallback: self.fallback,
            _marker: PhantomData,
        }
    }

    /// Install a fallback for otherwise-unsupported criteria shapes.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<dyn CriteriaFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a page request and return a bounded result slice with an
    /// estimated total (`UNKNOWN_TOTAL` when `want_count` is false).
    pub fn get_page(&self, request: &PageRequest, want_count: bool) -> Result<Page<E>, PageError> {
        self.get_page_with(request, want_count, true, |_, _| {})
    }

    /// `get_page` with a query customizer for adding fetches, joins, or
    /// extra restrictions before the request is planned.
    pub fn get_page_with<F>(
        &self,
        request: &PageRequest,
        want_count: bool,
        cacheable: bool,
        customize: F,
    ) -> Result<Page<E>, PageError>
    where
        F: FnOnce(&mut SelectQuery, &mut PathResolver),
    {
        self.hooks.before_page();

        let (query, count_query) =
            self.assemble(request, want_count, cacheable, customize, |_| Ok(Vec::new()), false)?;

        page_trace_query!(
            query.entity,
            query.has_restrictions(),
            query.offset,
            query.limit
        );

        let mut items = self.backend.execute(&query)?;
        let estimated_total = match &count_query {
            Some(count_query) => self.backend.execute_count(count_query)?,
            None => UNKNOWN_TOTAL,
        };

        if self.backend.profile().postponed_fetch == PostponedFetchKind::Secondary
            && !query.postponed.is_empty()
            && !items.is_empty()
        {
            self.resolve_postponed(&mut items, &query, request)?;
        }

        self.hooks.after_page();
        page_trace_page!(query.entity, items.len(), estimated_total);

        Ok(Page::new(items, request.page_offset(), estimated_total))
    }

    /// `get_page` for a projected (non-entity) result shape. The
    /// projection builder receives the path resolver and returns the
    /// ordered property-to-expression mapping; rows come back in mapping
    /// order.
    pub fn get_page_projected<P, F>(
        &self,
        request: &PageRequest,
        want_count: bool,
        cacheable: bool,
        projection: P,
        customize: F,
    ) -> Result<Page<Vec<Value>>, PageError>
    where
        P: FnOnce(&mut PathResolver) -> Result<Vec<(String, Expr)>, PageError>,
        F: FnOnce(&mut SelectQuery, &mut PathResolver),
    {
        self.hooks.before_page();

        let (query, count_query) =
            self.assemble(request, want_count, cacheable, customize, projection, true)?;

        page_trace_query!(
            query.entity,
            query.has_restrictions(),
            query.offset,
            query.limit
        );

        let items = self.backend.execute_projected(&query)?;
        let estimated_total = match &count_query {
            Some(count_query) => self.backend.execute_count(count_query)?,
            None => UNKNOWN_TOTAL,
        };

        self.hooks.after_page();
        page_trace_page!(query.entity, items.len(), estimated_total);

        Ok(Page::new(items, request.page_offset(), estimated_total))
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    // Build the main query and, when requested, the count query. Order of
    // operations: customizer, selection, ORDER BY, restrictions, cache
    // tags, count synthesis, range.
    fn assemble<F, P>(
        &self,
        request: &PageRequest,
        want_count: bool,
        cacheable: bool,
        customize: F,
        projection: P,
        projected: bool,
    ) -> Result<(SelectQuery, Option<CountQuery>), PageError>
    where
        F: FnOnce(&mut SelectQuery, &mut PathResolver),
        P: FnOnce(&mut PathResolver) -> Result<Vec<(String, Expr)>, PageError>,
    {
        let profile = self.backend.profile();
        let fetch_mode = match profile.postponed_fetch {
            PostponedFetchKind::None => FetchMode::Direct,
            PostponedFetchKind::Batch => FetchMode::Batch,
            PostponedFetchKind::Secondary => FetchMode::Secondary,
        };

        let mut resolver = PathResolver::new(E::MODEL);
        let mut query = SelectQuery::new(E::MODEL.entity_name, fetch_mode);
        customize(&mut query, &mut resolver);

        // Fetches are joins in disguise; seed the resolver so criteria and
        // ordering paths reuse them.
        let seeded: Vec<String> = query.joins.iter().map(|join| join.field.clone()).collect();
        for field in seeded {
            resolver.register_join(&field)?;
        }

        let mapping = projection(&mut resolver)?;
        let plan = plan_selection(mapping, projected)?;
        query.selection = plan.selection;
        query.group_by_root = query.group_by_root || plan.group_by_root;

        let selection = query.selection.clone();
        let mut fields = FieldResolver::new(&selection, &mut resolver);

        let order = build_order(
            request.ordering(),
            request.page_limit(),
            E::MODEL,
            &profile,
            &mut fields,
        )?;

        let existing = query.restriction.take();
        let outcome =
            build_restrictions(request, &mut fields, &profile, existing, self.fallback.as_deref())?;

        query.order = order;
        query.restriction = outcome.restriction;
        query.group_by_root = query.group_by_root || outcome.group_by_root;
        query.having = outcome.having;
        query.params.extend(outcome.params);

        // Joins created during path resolution belong to the query.
        for (alias, path) in resolver.joins() {
            if !query.joins.iter().any(|join| &join.alias == alias) {
                query.joins.push(JoinSpec {
                    field: path.field.clone(),
                    alias: alias.clone(),
                    fetch: false,
                });
            }
        }

        // Fetch joins amplify rows; deduplicate the roots.
        if query.has_fetch_joins() {
            query.distinct = true;
        }

        let page_key = request.fingerprint();
        query.hint(CACHE_REGION_HINT, page_key.clone());
        query.hint(CACHEABLE_HINT, cacheable.to_string());
        self.hooks.on_page(&page_key, cacheable);

        let count_query = want_count.then(|| self.count_query(&query));

        // Range: offset applies when the query joins or pages past the
        // start; limit applies when the query joins or is bounded.
        if query.has_joins() || request.page_offset() > 0 {
            query.offset = Some(request.page_offset());
        }
        if query.has_joins() || request.page_limit() != UNBOUNDED {
            query.limit = Some(request.page_limit());
        }

        Ok((query, count_query))
    }

    // `SELECT COUNT(root)`, constrained by an inner subquery exactly when
    // the main query carries any restriction, group, or having clause.
    fn count_query(&self, query: &SelectQuery) -> CountQuery {
        let shape = self.backend.profile().count_shape;
        if !query.has_restrictions() {
            return CountQuery {
                entity: query.entity,
                shape,
                sub: None,
            };
        }

        let mut sub = query.clone();
        sub.order.clear();
        sub.offset = None;
        sub.limit = None;
        sub.hints.clear();
        sub.postponed.clear();
        sub.distinct = false;

        CountQuery {
            entity: query.entity,
            shape,
            sub: Some(Box::new(sub)),
        }
    }

    // ------------------------------------------------------------------
    // Postponed fetches
    // ------------------------------------------------------------------

    // Secondary-kind resolution: one fetch query per postponed path, an
    // identity stitch of the returned roots, then the per-fetch filter,
    // sort, and write-back over the loaded collections.
    fn resolve_postponed(
        &self,
        items: &mut [E],
        query: &SelectQuery,
        request: &PageRequest,
    ) -> Result<(), PageError> {
        let ids: Vec<Value> = items.iter().map(EntityKind::id_value).collect();

        for path in &query.postponed {
            let fetched = self.backend.execute_fetch(&FetchQuery {
                entity: query.entity,
                path: path.clone(),
                ids: ids.clone(),
            })?;

            for entity in fetched {
                let id = entity.id_value();
                if let Some(slot) = items.iter_mut().find(|item| item.id_value() == id) {
                    *slot = entity;
                }
            }

            let filters = request.required_under(path);
            let ordering = request.ordering_under(path);

            for item in items.iter_mut() {
                let count = item.child_count(path);
                let mut selection: Vec<usize> = (0..count)
                    .filter(|&index| {
                        filters.iter().all(|(attribute, filter)| {
                            filter.applies(&item.child_value(path, index, attribute))
                        })
                    })
                    .collect();

                selection.sort_by(|&a, &b| {
                    compare_children(item, path, a, b, &ordering)
                });

                item.apply_child_selection(path, &selection);
            }

            // When the page ordering references this to-many path, parents
            // re-sort by the first element of their filtered child list.
            if let Some((attribute, direction)) = ordering.first() {
                items.sort_by(|a, b| {
                    let cmp = a
                        .child_value(path, 0, attribute)
                        .canonical_cmp(&b.child_value(path, 0, attribute));
                    apply_direction(cmp, *direction)
                });
            }
        }

        Ok(())
    }
}

fn compare_children<E: EntityKind>(
    item: &E,
    path: &str,
    a: usize,
    b: usize,
    ordering: &[(&str, OrderDirection)],
) -> Ordering {
    for (attribute, direction) in ordering {
        let cmp = item
            .child_value(path, a, attribute)
            .canonical_cmp(&item.child_value(path, b, attribute));
        let cmp = apply_direction(cmp, *direction);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    Ordering::Equal
}

const fn apply_direction(cmp: Ordering, direction: OrderDirection) -> Ordering {
    match direction {
        OrderDirection::Asc => cmp,
        OrderDirection::Desc => cmp.reverse(),
    }
}
