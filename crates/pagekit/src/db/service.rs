use crate::error::Error;
use pagekit_core::query::backend::Backend;
use pagekit_core::query::expr::Expr;
use pagekit_core::query::page::{NoHooks, PageHooks, Pager};
use pagekit_core::query::paths::PathResolver;
use pagekit_core::query::plan::SelectQuery;
use pagekit_core::query::request::PageRequest;
use pagekit_core::query::restrict::CriteriaFallback;
use pagekit_core::response::Page;
use pagekit_core::traits::EntityKind;
use pagekit_core::value::Value;

///
/// PageService
/// Public facade over the paging engine for one entity type.
/// Converts core errors into `pagekit::Error`.
///

pub struct PageService<E: EntityKind, B: Backend<E>, H: PageHooks = NoHooks> {
    pager: Pager<E, B, H>,
}

impl<E, B> PageService<E, B>
where
    E: EntityKind,
    B: Backend<E>,
{
    /// Create a service backed by the provided execution surface.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            pager: Pager::new(backend),
        }
    }
}

impl<E, B, H> PageService<E, B, H>
where
    E: EntityKind,
    B: Backend<E>,
    H: PageHooks,
{
    /// Replace the page lifecycle hooks.
    #[must_use]
    pub fn with_hooks<H2: PageHooks>(self, hooks: H2) -> PageService<E, B, H2> {
        PageService {
            pager: self.pager.with_hooks(hooks),
        }
    }

    /// Install a fallback for otherwise-unsupported criteria shapes.
    #[must_use]
    pub fn with_fallback(self, fallback: Box<dyn CriteriaFallback>) -> Self {
        Self {
            pager: self.pager.with_fallback(fallback),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        self.pager.backend()
    }

    /// Run a page request and return a bounded slice with an estimated
    /// total when `want_count` is set.
    pub fn get_page(&self, request: &PageRequest, want_count: bool) -> Result<Page<E>, Error> {
        Ok(self.pager.get_page(request, want_count)?)
    }

    /// `get_page` with a query customizer for installing fetches, joins,
    /// or extra restrictions.
    pub fn get_page_with<F>(
        &self,
        request: &PageRequest,
        want_count: bool,
        cacheable: bool,
        customize: F,
    ) -> Result<Page<E>, Error>
    where
        F: FnOnce(&mut SelectQuery, &mut PathResolver),
    {
        Ok(self
            .pager
            .get_page_with(request, want_count, cacheable, customize)?)
    }

    /// `get_page` projecting into value rows via an ordered
    /// property-to-expression mapping.
    pub fn get_page_projected<P, F>(
        &self,
        request: &PageRequest,
        want_count: bool,
        cacheable: bool,
        projection: P,
        customize: F,
    ) -> Result<Page<Vec<Value>>, Error>
    where
        P: FnOnce(
            &mut PathResolver,
        ) -> Result<Vec<(String, Expr)>, pagekit_core::error::PageError>,
        F: FnOnce(&mut SelectQuery, &mut PathResolver),
    {
        Ok(self
            .pager
            .get_page_projected(request, want_count, cacheable, projection, customize)?)
    }
}
