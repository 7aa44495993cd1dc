//! In-memory pricing store.
//!
//! Provides a fast, non-persistent implementation of every [`EntityStore`]
//! and of [`CatalogService`] for tests and embedding.

use crate::models::search::{keyword_matches, matches_any, matches_any_ignore_case};
use crate::models::{
    Catalog, Entity, Page, Price, Pricelist, PricelistAssignment,
    PricelistAssignmentsSearchCriteria, PricelistSearchCriteria, PricesSearchCriteria,
    SearchCriteria,
};
use crate::storage::traits::{CatalogService, EntityStore};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table<T> = RwLock<BTreeMap<String, T>>;

/// In-memory pricing store.
///
/// Records are kept per kind in id order, which is also the order of
/// `search` and `get_by_ids` results.
///
/// # Example
///
/// ```rust,ignore
/// use pricing_transfer::{Catalog, InMemoryPricingStore, PricingStores};
///
/// let store = InMemoryPricingStore::new().with_catalogs([Catalog::new("cat", "Main")]);
/// let stores = PricingStores::from_backend(Arc::new(store));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryPricingStore {
    pricelists: Table<Pricelist>,
    assignments: Table<PricelistAssignment>,
    prices: Table<Price>,
    catalogs: Table<Catalog>,
}

impl InMemoryPricingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds catalogs available for enrichment lookups.
    ///
    /// Recovers a poisoned catalog table.
    #[must_use]
    pub fn with_catalogs(mut self, catalogs: impl IntoIterator<Item = Catalog>) -> Self {
        let table = self
            .catalogs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        table.extend(catalogs.into_iter().map(|c| (c.id.clone(), c)));
        self.catalogs.clear_poison();
        self
    }

    /// Adds or replaces a catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog table lock is poisoned.
    pub fn add_catalog(&self, catalog: Catalog) -> Result<()> {
        write_table(&self.catalogs, "add_catalog")?.insert(catalog.id.clone(), catalog);
        Ok(())
    }
}

fn read_table<'a, T>(
    table: &'a Table<T>,
    operation: &str,
) -> Result<RwLockReadGuard<'a, BTreeMap<String, T>>> {
    table.read().map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}

fn write_table<'a, T>(
    table: &'a Table<T>,
    operation: &str,
) -> Result<RwLockWriteGuard<'a, BTreeMap<String, T>>> {
    table.write().map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    })
}

fn get_by_ids_in<T: Clone>(table: &Table<T>, ids: &[String], operation: &str) -> Result<Vec<T>> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let guard = read_table(table, operation)?;
    Ok(guard
        .iter()
        .filter(|(id, _)| wanted.contains(id.as_str()))
        .map(|(_, item)| item.clone())
        .collect())
}

fn search_in<T: Entity>(
    table: &Table<T>,
    base: &SearchCriteria,
    matches: impl Fn(&T) -> bool,
    operation: &str,
) -> Result<Page<T>> {
    let ids: HashSet<String> = base.requested_ids().into_iter().collect();
    let guard = read_table(table, operation)?;
    let filtered: Vec<&T> = guard
        .values()
        .filter(|item| ids.is_empty() || ids.contains(item.id()))
        .filter(|item| matches(item))
        .collect();

    let total_count = filtered.len();
    let results = filtered
        .into_iter()
        .skip(base.skip)
        .take(base.take)
        .cloned()
        .collect();
    Ok(Page::new(results, total_count))
}

fn save_into<T: Entity>(table: &Table<T>, items: &[T], operation: &str) -> Result<()> {
    let mut guard = write_table(table, operation)?;
    for item in items {
        let mut item = item.clone();
        if item.is_transient() {
            item.set_id(uuid::Uuid::new_v4().to_string());
        }
        guard.insert(item.id().to_string(), item);
    }
    Ok(())
}

fn delete_from<T>(table: &Table<T>, ids: &[String], operation: &str) -> Result<()> {
    let mut guard = write_table(table, operation)?;
    for id in ids {
        guard.remove(id);
    }
    Ok(())
}

fn pricelist_matches(pricelist: &Pricelist, criteria: &PricelistSearchCriteria) -> bool {
    matches_any_ignore_case(&criteria.currencies, &pricelist.currency)
        && keyword_matches(
            criteria.base.keyword(),
            [
                Some(pricelist.name.as_str()),
                pricelist.description.as_deref(),
            ],
        )
}

fn assignment_matches(
    assignment: &PricelistAssignment,
    criteria: &PricelistAssignmentsSearchCriteria,
) -> bool {
    matches_any(&criteria.pricelist_ids, &assignment.pricelist_id)
        && matches_any(&criteria.catalog_ids, &assignment.catalog_id)
        && keyword_matches(
            criteria.base.keyword(),
            [
                Some(assignment.name.as_str()),
                assignment.description.as_deref(),
            ],
        )
}

fn price_matches(price: &Price, criteria: &PricesSearchCriteria) -> bool {
    matches_any(&criteria.pricelist_ids, &price.pricelist_id)
        && matches_any(&criteria.product_ids, &price.product_id)
        && keyword_matches(criteria.base.keyword(), [Some(price.product_id.as_str())])
}

impl EntityStore<Pricelist> for InMemoryPricingStore {
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Pricelist>> {
        get_by_ids_in(&self.pricelists, ids, "get_pricelists")
    }

    fn search(&self, criteria: &PricelistSearchCriteria) -> Result<Page<Pricelist>> {
        search_in(
            &self.pricelists,
            &criteria.base,
            |p| pricelist_matches(p, criteria),
            "search_pricelists",
        )
    }

    fn save(&self, items: &[Pricelist]) -> Result<()> {
        save_into(&self.pricelists, items, "save_pricelists")
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        delete_from(&self.pricelists, ids, "delete_pricelists")
    }
}

impl EntityStore<PricelistAssignment> for InMemoryPricingStore {
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<PricelistAssignment>> {
        get_by_ids_in(&self.assignments, ids, "get_assignments")
    }

    fn search(
        &self,
        criteria: &PricelistAssignmentsSearchCriteria,
    ) -> Result<Page<PricelistAssignment>> {
        search_in(
            &self.assignments,
            &criteria.base,
            |a| assignment_matches(a, criteria),
            "search_assignments",
        )
    }

    fn save(&self, items: &[PricelistAssignment]) -> Result<()> {
        save_into(&self.assignments, items, "save_assignments")
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        delete_from(&self.assignments, ids, "delete_assignments")
    }
}

impl EntityStore<Price> for InMemoryPricingStore {
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Price>> {
        get_by_ids_in(&self.prices, ids, "get_prices")
    }

    fn search(&self, criteria: &PricesSearchCriteria) -> Result<Page<Price>> {
        search_in(
            &self.prices,
            &criteria.base,
            |p| price_matches(p, criteria),
            "search_prices",
        )
    }

    fn save(&self, items: &[Price]) -> Result<()> {
        save_into(&self.prices, items, "save_prices")
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        delete_from(&self.prices, ids, "delete_prices")
    }
}

impl CatalogService for InMemoryPricingStore {
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Catalog>> {
        get_by_ids_in(&self.catalogs, ids, "get_catalogs")
    }
}
