use crate::query::expr::Expr;
use crate::query::paths::{PathError, PathResolver};
use thiserror::Error as ThisError;

///
/// Selection
///
/// Either the root entity or an ordered projection of property
/// expressions. Projection order defines multiselect order.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Root,
    Projection(Vec<ProjectedProperty>),
}

///
/// ProjectedProperty
///

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedProperty {
    /// Result-type property this selection feeds.
    pub property: String,
    /// Selection alias (`as_` + property with dots replaced).
    pub alias: String,
    pub expr: Expr,
}

///
/// ProjectionError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ProjectionError {
    #[error("projected result type requires an explicit property mapping")]
    MissingMapping,
}

///
/// SelectionPlan
///

#[derive(Debug)]
pub struct SelectionPlan {
    pub selection: Selection,
    /// Aggregated selections force an immediate GROUP BY on the root.
    pub group_by_root: bool,
}

/// Fix the select shape. An empty mapping selects the root when the result
/// type is the entity type, and is fatal otherwise.
pub fn plan_selection(
    mapping: Vec<(String, Expr)>,
    projected: bool,
) -> Result<SelectionPlan, ProjectionError> {
    if mapping.is_empty() {
        if projected {
            return Err(ProjectionError::MissingMapping);
        }

        return Ok(SelectionPlan {
            selection: Selection::Root,
            group_by_root: false,
        });
    }

    let group_by_root = mapping.iter().any(|(_, expr)| expr.is_aggregation());
    let properties = mapping
        .into_iter()
        .map(|(property, expr)| {
            let alias = format!("as_{}", property.replace('.', "$"));
            ProjectedProperty {
                property,
                alias,
                expr,
            }
        })
        .collect();

    Ok(SelectionPlan {
        selection: Selection::Projection(properties),
        group_by_root,
    })
}

///
/// FieldResolver
///
/// Projection-aware resolver: consults the property mapping first, then
/// falls back to the root-based path resolver.
///

pub struct FieldResolver<'a> {
    selection: &'a Selection,
    paths: &'a mut PathResolver,
}

impl<'a> FieldResolver<'a> {
    #[must_use]
    pub fn new(selection: &'a Selection, paths: &'a mut PathResolver) -> Self {
        Self { selection, paths }
    }

    pub fn resolve(&mut self, field: &str) -> Result<Expr, PathError> {
        if let Selection::Projection(properties) = self.selection
            && let Some(hit) = properties.iter().find(|p| p.property == field)
        {
            return Ok(hit.expr.clone());
        }

        Ok(Expr::Path(self.paths.get(field)?))
    }

    pub fn paths(&mut self) -> &mut PathResolver {
        self.paths
    }
}
