#[cfg(test)]
mod tests;

use crate::model::{AttributeKind, EntityModel, RelationPaths, lookup_model, relation_paths};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error as ThisError;

///
/// ResolvedPath
///
/// Immutable resolution result shared through `Arc` so repeated
/// resolutions of the same field observe the same path object.
///

#[derive(Debug, PartialEq)]
pub struct ResolvedPath {
    /// Dotted attribute path from the root, explicit-join marker stripped.
    pub field: String,
    /// Canonical alias of the join this path creates or passes through.
    pub join: Option<String>,
    /// Terminal attribute kind.
    pub kind: AttributeKind,
}

pub type PathRef = Arc<ResolvedPath>;

///
/// PathError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PathError {
    #[error("unknown field `{field}` on entity {entity}")]
    UnknownField { field: String, entity: &'static str },

    #[error("entity model `{path}` is not registered")]
    UnregisteredModel { path: &'static str },
}

///
/// PathResolver
///
/// Per-invocation resolver from dotted field names to path expressions.
/// Holds the root model, the join map (seeded from pre-existing joins and
/// fetches, since fetches are joins in disguise), a memo cache, and the
/// precomputed relation-path sets for the root type.
///
/// Scratch state; never shared across invocations.
///

pub struct PathResolver {
    model: &'static EntityModel,
    relations: Arc<RelationPaths>,
    joins: BTreeMap<String, PathRef>,
    cache: BTreeMap<String, PathRef>,
}

impl PathResolver {
    #[must_use]
    pub fn new(model: &'static EntityModel) -> Self {
        Self {
            model,
            relations: relation_paths(model),
            joins: BTreeMap::new(),
            cache: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn root_model(&self) -> &'static EntityModel {
        self.model
    }

    #[must_use]
    pub fn relations(&self) -> &RelationPaths {
        &self.relations
    }

    /// Canonical join alias for an element-collection field. The same
    /// alias is reused for the same field throughout a query.
    #[must_use]
    pub fn join_alias(field: &str) -> String {
        format!("@{field}")
    }

    /// Seed a pre-existing join or fetch so later resolutions reuse it.
    /// Every segment of the field must be relation-valued.
    pub fn register_join(&mut self, field: &str) -> Result<(), PathError> {
        let stripped = field.strip_prefix('@').unwrap_or(field);
        let mut current = self.model;
        let mut prefix = String::new();

        for segment in stripped.split('.') {
            let attr = current
                .attribute(segment)
                .ok_or_else(|| self.unknown(field))?;

            if prefix.is_empty() {
                prefix.push_str(segment);
            } else {
                prefix.push('.');
                prefix.push_str(segment);
            }

            match attr.kind {
                AttributeKind::ToOne { target_path }
                | AttributeKind::OneToMany { target_path } => {
                    self.join_step(&prefix, attr.kind, false);
                    current = lookup_model(target_path)
                        .ok_or(PathError::UnregisteredModel { path: target_path })?;
                }
                AttributeKind::ElementCollection(_) => {
                    self.join_step(&prefix, attr.kind, false);
                }
                // Scalars cannot be joined.
                _ => return Err(self.unknown(field)),
            }
        }

        Ok(())
    }

    /// Joins created or registered so far, keyed by alias.
    pub fn joins(&self) -> impl Iterator<Item = (&String, &PathRef)> {
        self.joins.iter()
    }

    /// The join path registered under an alias, if any.
    #[must_use]
    pub fn join(&self, alias: &str) -> Option<&PathRef> {
        self.joins.get(alias)
    }

    /// The shared join path for an element-collection field, created on
    /// first use.
    pub fn element_join(&mut self, field: &str) -> Result<PathRef, PathError> {
        let alias = Self::join_alias(field);
        if let Some(path) = self.joins.get(&alias) {
            return Ok(path.clone());
        }

        self.get(field)?;
        self.joins
            .get(&alias)
            .cloned()
            .ok_or_else(|| self.unknown(field))
    }

    /// Resolve a dotted field name to a path expression.
    ///
    /// Two calls with the same field return the same path object.
    pub fn get(&mut self, field: &str) -> Result<PathRef, PathError> {
        if let Some(hit) = self.cache.get(field) {
            return Ok(hit.clone());
        }

        let explicit = field.starts_with('@');
        let stripped = field.strip_prefix('@').unwrap_or(field);
        let resolved = self.walk(field, stripped, explicit)?;
        self.cache.insert(field.to_string(), resolved.clone());

        Ok(resolved)
    }

    fn walk(&mut self, original: &str, stripped: &str, explicit: bool) -> Result<PathRef, PathError> {
        let segments: Vec<&str> = stripped.split('.').collect();
        let mut current = self.model;
        let mut prefix = String::new();
        let mut join: Option<String> = None;
        let mut kind = current.id.kind;

        for (index, segment) in segments.iter().enumerate() {
            let last = index + 1 == segments.len();
            let attr = match current.attribute(segment) {
                Some(attr) if !matches!(attr.kind, AttributeKind::Transient) => attr,
                _ if segments.len() == 1 => return self.transient_fallback(original, segment),
                _ => return Err(self.unknown(original)),
            };

            if prefix.is_empty() {
                prefix.push_str(segment);
            } else {
                prefix.push('.');
                prefix.push_str(segment);
            }

            let join_step = !last || attr.kind.is_element_collection();
            if join_step {
                join = Some(self.join_step(&prefix, attr.kind, explicit));

                match attr.kind {
                    AttributeKind::ToOne { target_path }
                    | AttributeKind::OneToMany { target_path } => {
                        current = lookup_model(target_path)
                            .ok_or(PathError::UnregisteredModel { path: target_path })?;
                    }
                    AttributeKind::ElementCollection(_) if last => {}
                    // Element values and scalars have no joinable attributes.
                    _ => return Err(self.unknown(original)),
                }
            }

            if last {
                kind = attr.kind;
            }
        }

        Ok(Arc::new(ResolvedPath {
            field: stripped.to_string(),
            join,
            kind,
        }))
    }

    // One join step: element-collection joins always share the canonical
    // `@field` alias; explicit joins are created fresh and never reused;
    // ordinary joins reuse the join map entry for their prefix.
    fn join_step(&mut self, prefix: &str, kind: AttributeKind, explicit: bool) -> String {
        let element = kind.is_element_collection();
        let alias = if element {
            Self::join_alias(prefix)
        } else {
            prefix.to_string()
        };

        let reuse = element || !explicit;
        if !reuse || !self.joins.contains_key(&alias) {
            let path = Arc::new(ResolvedPath {
                field: prefix.to_string(),
                join: Some(alias.clone()),
                kind,
            });
            if reuse {
                self.joins.insert(alias.clone(), path);
            }
        }

        alias
    }

    // Single-segment fallback: retry the attribute through each to-one
    // relation of the root, first success wins.
    fn transient_fallback(&mut self, original: &str, segment: &str) -> Result<PathRef, PathError> {
        let candidates: Vec<&'static str> = self
            .model
            .to_one_attributes()
            .map(|attr| attr.name)
            .collect();

        for relation in candidates {
            let candidate = format!("{relation}.{segment}");
            if let Ok(resolved) = self.get(&candidate) {
                self.cache.insert(original.to_string(), resolved.clone());
                return Ok(resolved);
            }
        }

        Err(self.unknown(original))
    }

    fn unknown(&self, field: &str) -> PathError {
        PathError::UnknownField {
            field: field.to_string(),
            entity: self.model.entity_name,
        }
    }
}
