//! Query and page observability events.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]`
//! boilerplate at every call site.

/// Emit a debug-level event for one executed backend query.
#[macro_export]
macro_rules! page_trace_query {
    ($entity:expr, $restricted:expr, $offset:expr, $limit:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            entity = $entity,
            restricted = $restricted,
            offset = ?$offset,
            limit = ?$limit,
            "pagekit.query"
        );
    };
}

/// Emit a debug-level event for one completed page.
#[macro_export]
macro_rules! page_trace_page {
    ($entity:expr, $rows:expr, $total:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            entity = $entity,
            rows = $rows,
            total = $total,
            "pagekit.page"
        );
    };
}
