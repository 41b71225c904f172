use crate::query::backend::BackendError;
use crate::query::criteria::CriteriaError;
use crate::query::order::OrderError;
use crate::query::paths::PathError;
use crate::query::restrict::RestrictionError;
use crate::query::select::ProjectionError;
use thiserror::Error as ThisError;

///
/// PageError
///
/// Everything that can surface at the `get_page` boundary. Filter input
/// is tolerant and never reaches here (unknown/unparseable fields are
/// dropped); projection, ordering, and criteria construction are strict;
/// backend faults propagate unchanged.
///

#[derive(Debug, ThisError)]
pub enum PageError {
    #[error("{0}")]
    Criteria(#[from] CriteriaError),

    #[error("{0}")]
    Path(#[from] PathError),

    #[error("{0}")]
    Projection(#[from] ProjectionError),

    #[error("{0}")]
    Order(#[from] OrderError),

    #[error("{0}")]
    Restriction(#[from] RestrictionError),

    #[error("{0}")]
    Backend(#[from] BackendError),
}
