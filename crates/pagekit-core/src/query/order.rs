use crate::model::{EntityModel, is_to_many_path};
use crate::query::dialect::{DialectProfile, PostponedFetchKind};
use crate::query::expr::Expr;
use crate::query::plan::OrderDirection;
use crate::query::select::FieldResolver;
use thiserror::Error as ThisError;

///
/// Order builder
///
/// Translates the request's ordering sequence into backend ORDER BY keys.
/// Ordering fields are programmer-controlled: unknown fields are fatal,
/// and to-many orderings are refused before any backend interaction on
/// backends that cannot paginate them.
///

///
/// OrderError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum OrderError {
    #[error("unknown ordering field `{field}`")]
    UnknownField { field: String },

    #[error("ordering through to-many path `{field}` is not supported on this backend")]
    UnsupportedOrdering { field: String },
}

/// Build ORDER BY keys for the request.
///
/// A single-row window skips the ORDER BY entirely.
pub fn build_order(
    ordering: &[(String, OrderDirection)],
    window: u64,
    model: &'static EntityModel,
    profile: &DialectProfile,
    resolver: &mut FieldResolver<'_>,
) -> Result<Vec<(Expr, OrderDirection)>, OrderError> {
    if window == 1 {
        return Ok(Vec::new());
    }

    let mut order = Vec::with_capacity(ordering.len());
    for (field, direction) in ordering {
        if profile.postponed_fetch != PostponedFetchKind::None && is_to_many_path(model, field) {
            return Err(OrderError::UnsupportedOrdering {
                field: field.clone(),
            });
        }

        let expr = resolver
            .resolve(field)
            .map_err(|_| OrderError::UnknownField {
                field: field.clone(),
            })?;

        order.push((expr, *direction));
    }

    Ok(order)
}
