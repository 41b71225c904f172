use crate::query::dialect::DialectProfile;
use crate::query::plan::{CountQuery, FetchQuery, SelectQuery};
use crate::traits::EntityKind;
use crate::value::Value;
use thiserror::Error as ThisError;

///
/// BackendError
///
/// Opaque backend fault. The core never retries and never interprets
/// these; they propagate unchanged through the `get_page` boundary.
///

#[derive(Debug, ThisError)]
#[error("backend failure: {message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// Backend
///
/// Narrow execution surface the paging engine needs from the relational
/// layer: the dialect capability profile plus execution of the three
/// query shapes. The backend is borrowed from the caller's context and
/// assumed to be scoped to the caller's transaction; the core opens no
/// transactions and installs no timeouts.
///

pub trait Backend<E: EntityKind> {
    /// Capability flags for the backing mapper and dialect.
    fn profile(&self) -> DialectProfile;

    /// Execute the main query and return root entities in result order.
    fn execute(&self, query: &SelectQuery) -> Result<Vec<E>, BackendError>;

    /// Execute a projected main query and return value rows in selection
    /// order.
    fn execute_projected(&self, query: &SelectQuery) -> Result<Vec<Vec<Value>>, BackendError>;

    /// Execute a count query and return the distinct root count.
    fn execute_count(&self, query: &CountQuery) -> Result<i64, BackendError>;

    /// Execute a postponed-fetch secondary query; returned entities carry
    /// the fetched collection loaded.
    fn execute_fetch(&self, query: &FetchQuery) -> Result<Vec<E>, BackendError>;
}
