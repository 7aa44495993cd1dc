//! Paged export data sources.
//!
//! A data source turns an [`ExportDataQuery`] and a `(skip, take)` window
//! into one page of enriched, exportable records:
//!
//! 1. build the kind's search criteria from the query and the window
//! 2. fetch the raw page ([`PageFetcher`])
//! 3. enrich it ([`Enricher`])
//! 4. when fetched by explicit ids, reorder to the requested id order
//!
//! Sources hold no cursor between calls.

mod assignment;
mod enrichment;
mod fetcher;
mod price;
mod pricelist;

pub use assignment::PricelistAssignmentExportPagedDataSource;
pub use enrichment::{Enricher, Relation, distinct_ids};
pub use fetcher::PageFetcher;
pub use price::PriceExportPagedDataSource;
pub use pricelist::PricelistExportPagedDataSource;

use crate::Result;
use crate::io::traits::{ExportRecord, PagedDataSource};
use crate::models::{Criteria, Entity, EntityKind, Page, SearchCriteria};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selection of records to export.
///
/// Every filter is optional. Filters that do not apply to a kind are
/// ignored by that kind's source (for example `product_ids` for price
/// lists).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportDataQuery {
    /// Explicit ids. When non-blank ids are present paging is ignored and
    /// the output follows this order.
    pub object_ids: Vec<String>,
    /// Case-insensitive substring filter.
    pub keyword: Option<String>,
    /// Restrict to these price lists.
    pub pricelist_ids: Vec<String>,
    /// Restrict to these catalogs (assignments).
    pub catalog_ids: Vec<String>,
    /// Restrict to these products (prices).
    pub product_ids: Vec<String>,
    /// Restrict to these currencies (price lists).
    pub currencies: Vec<String>,
}

impl ExportDataQuery {
    /// Creates a query selecting everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the explicit id list.
    #[must_use]
    pub fn with_object_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the keyword filter.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    /// Sets the price list filter.
    #[must_use]
    pub fn with_pricelist_ids(mut self, ids: Vec<String>) -> Self {
        self.pricelist_ids = ids;
        self
    }

    /// Sets the catalog filter.
    #[must_use]
    pub fn with_catalog_ids(mut self, ids: Vec<String>) -> Self {
        self.catalog_ids = ids;
        self
    }

    /// Sets the product filter.
    #[must_use]
    pub fn with_product_ids(mut self, ids: Vec<String>) -> Self {
        self.product_ids = ids;
        self
    }

    /// Sets the currency filter.
    #[must_use]
    pub fn with_currencies(mut self, currencies: Vec<String>) -> Self {
        self.currencies = currencies;
        self
    }

    /// Returns the generic criteria for a window.
    #[must_use]
    pub fn base_criteria(&self, skip: usize, take: usize) -> SearchCriteria {
        SearchCriteria {
            skip,
            take,
            keyword: self.keyword.clone(),
            object_ids: self.object_ids.clone(),
        }
    }
}

/// Builds the kind's criteria from the query and the generic part.
pub type CriteriaBuilder<T> = fn(&ExportDataQuery, SearchCriteria) -> <T as Entity>::Criteria;

/// Generic paged data source over one entity kind.
pub struct ExportPagedDataSource<T: Entity, X> {
    query: ExportDataQuery,
    fetcher: PageFetcher<T>,
    enricher: Enricher<T, X>,
    build_criteria: CriteriaBuilder<T>,
}

impl<T: Entity, X: ExportRecord> ExportPagedDataSource<T, X> {
    /// Assembles a source from its stages.
    #[must_use]
    pub fn from_parts(
        query: ExportDataQuery,
        fetcher: PageFetcher<T>,
        enricher: Enricher<T, X>,
        build_criteria: CriteriaBuilder<T>,
    ) -> Self {
        Self {
            query,
            fetcher,
            enricher,
            build_criteria,
        }
    }

    /// Skips relation lookups; records carry no denormalized names.
    #[must_use]
    pub fn without_enrichment(mut self) -> Self {
        self.enricher = self.enricher.without_relations();
        self
    }

    /// Returns the criteria for a window.
    #[must_use]
    pub fn criteria(&self, skip: usize, take: usize) -> T::Criteria {
        (self.build_criteria)(&self.query, self.query.base_criteria(skip, take))
    }
}

impl<T: Entity, X: ExportRecord> PagedDataSource for ExportPagedDataSource<T, X> {
    type Record = X;

    fn kind(&self) -> EntityKind {
        T::KIND
    }

    fn fetch_page(&self, skip: usize, take: usize) -> Result<Page<X>> {
        let criteria = self.criteria(skip, take);
        let page = self.fetcher.fetch(&criteria)?;
        let mut records = self.enricher.enrich(&page.results)?;

        if criteria.base().has_object_ids() {
            restore_requested_order(&mut records, &criteria.base().requested_ids());
        }

        Ok(Page::new(records, page.total_count))
    }
}

/// Stable-sorts `records` by the position of their id in `requested`.
///
/// Records whose id was not requested keep their relative order at the end.
pub fn restore_requested_order<X: ExportRecord>(records: &mut [X], requested: &[String]) {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(requested.len());
    for (position, id) in requested.iter().enumerate() {
        positions.entry(id.as_str()).or_insert(position);
    }
    records.sort_by_key(|record| positions.get(record.id()).copied().unwrap_or(usize::MAX));
}
