//! Enrichment stage.
//!
//! Projects raw entities into exportable records and stamps denormalized
//! names of related entities. Each relation is resolved with one bulk
//! lookup per page over the distinct, non-blank foreign ids of that page.
//! Unresolved relations leave the name unset.

use crate::models::{Entity, Pricelist};
use crate::storage::{CatalogService, EntityStore};
use crate::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type NameLookup = Box<dyn Fn(&[String]) -> Result<Vec<(String, String)>> + Send + Sync>;

/// One foreign-key relation resolved to a display name.
pub struct Relation<T, X> {
    name: &'static str,
    foreign_id: fn(&T) -> &str,
    lookup: NameLookup,
    stamp: fn(&mut X, String),
}

impl<T, X> Relation<T, X> {
    /// Creates a relation from its parts.
    ///
    /// `lookup` receives distinct ids and returns `(id, name)` pairs for the
    /// ids it can resolve.
    pub fn new(
        name: &'static str,
        foreign_id: fn(&T) -> &str,
        lookup: impl Fn(&[String]) -> Result<Vec<(String, String)>> + Send + Sync + 'static,
        stamp: fn(&mut X, String),
    ) -> Self {
        Self {
            name,
            foreign_id,
            lookup: Box::new(lookup),
            stamp,
        }
    }

    /// Resolves catalog names through `catalogs`.
    pub fn catalog_names(
        catalogs: Arc<dyn CatalogService>,
        foreign_id: fn(&T) -> &str,
        stamp: fn(&mut X, String),
    ) -> Self {
        Self::new(
            "catalogs",
            foreign_id,
            move |ids| {
                Ok(catalogs
                    .get_by_ids(ids)?
                    .into_iter()
                    .map(|c| (c.id, c.name))
                    .collect())
            },
            stamp,
        )
    }

    /// Resolves price list names through `pricelists`.
    pub fn pricelist_names(
        pricelists: Arc<dyn EntityStore<Pricelist>>,
        foreign_id: fn(&T) -> &str,
        stamp: fn(&mut X, String),
    ) -> Self {
        Self::new(
            "pricelists",
            foreign_id,
            move |ids| {
                Ok(pricelists
                    .get_by_ids(ids)?
                    .into_iter()
                    .map(|p| (p.id, p.name))
                    .collect())
            },
            stamp,
        )
    }
}

/// Projection plus relation resolution for one entity kind.
pub struct Enricher<T, X> {
    project: fn(&T) -> X,
    relations: Vec<Relation<T, X>>,
}

impl<T: Entity, X> Enricher<T, X> {
    /// Creates an enricher that only projects.
    #[must_use]
    pub fn new(project: fn(&T) -> X) -> Self {
        Self {
            project,
            relations: Vec::new(),
        }
    }

    /// Creates an enricher projecting with `X: From<&T>`.
    #[must_use]
    pub fn projecting() -> Self
    where
        X: for<'a> From<&'a T>,
    {
        Self::new(project_from::<T, X>)
    }

    /// Adds a relation.
    #[must_use]
    pub fn with_relation(mut self, relation: Relation<T, X>) -> Self {
        self.relations.push(relation);
        self
    }

    /// Drops every relation, leaving projection only.
    #[must_use]
    pub fn without_relations(mut self) -> Self {
        self.relations.clear();
        self
    }

    /// Enriches `records`, keeping their count and order.
    ///
    /// An empty batch performs no lookups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchFailed`] if a lookup collaborator fails.
    pub fn enrich(&self, records: &[T]) -> Result<Vec<X>> {
        let mut exportables: Vec<X> = records.iter().map(self.project).collect();

        for relation in &self.relations {
            let ids = distinct_ids(records.iter().map(relation.foreign_id));
            if ids.is_empty() {
                continue;
            }

            let names: HashMap<String, String> = (relation.lookup)(&ids)
                .map_err(|e| Error::fetch(relation.name, e))?
                .into_iter()
                .collect();

            for (record, exportable) in records.iter().zip(exportables.iter_mut()) {
                if let Some(name) = names.get((relation.foreign_id)(record)) {
                    (relation.stamp)(exportable, name.clone());
                }
            }
        }

        Ok(exportables)
    }
}

fn project_from<T, X: for<'a> From<&'a T>>(entity: &T) -> X {
    X::from(entity)
}

/// Returns the distinct non-blank ids in first-seen order.
pub fn distinct_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !id.trim().is_empty())
        .filter(|id| seen.insert(*id))
        .map(ToString::to_string)
        .collect()
}
