//! # pagekit
//!
//! `pagekit` is the **public facade crate** for the Pagekit paging engine.
//! It is the recommended dependency for downstream projects.
//!
//! A [`db::PageService`] turns a declarative [`PageRequest`] — sort keys,
//! required filters, optional filters, and a pagination range — into one
//! or two structured queries against a backend, and returns a bounded
//! [`Page`] annotated with an estimated total count.
//!
//! ## Crate layout
//!
//! - `db`
//!   The service facade: `PageService` with hook, customizer, and
//!   projection overloads.
//!
//! - `error`
//!   Public error type with a stable class + origin taxonomy.
//!
//! - `prelude`
//!   Opinionated prelude for caller code.
//!
//! Engine internals (the criteria vocabulary, path resolution, the query
//! IR, and the in-memory reference backend) live in `pagekit-core` and
//! are re-exported through [`core`].
//!
//! [`PageRequest`]: pagekit_core::query::request::PageRequest
//! [`Page`]: pagekit_core::response::Page

pub mod db;
pub mod error;

pub use error::{Error, ErrorClass, ErrorOrigin};
pub use pagekit_core as core;

///
/// Prelude
///

pub mod prelude {
    pub use crate::db::PageService;
    pub use crate::error::Error;
    pub use pagekit_core::memory::MemoryBackend;
    pub use pagekit_core::prelude::*;
    pub use pagekit_core::query::dialect::DialectProfile;
}
