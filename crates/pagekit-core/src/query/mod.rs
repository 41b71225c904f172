//! Query planning modules.
//!
//! A page request flows through: path resolution (`paths`), selection
//! shaping (`select`), ORDER BY translation (`order`), criteria dispatch
//! (`criteria` via `restrict`), and final assembly plus execution
//! (`page`). The emitted IR lives in `expr`/`plan`; backend capability
//! flags live in `dialect`; the execution surface in `backend`.

pub mod alias;
pub mod backend;
pub mod criteria;
pub mod dialect;
pub mod expr;
pub mod order;
pub mod page;
pub mod params;
pub mod paths;
pub mod plan;
pub mod request;
pub mod restrict;
pub mod select;
