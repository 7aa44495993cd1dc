//! Price list export source.

use super::{Enricher, ExportDataQuery, ExportPagedDataSource, PageFetcher};
use crate::io::traits::ExportablePricelist;
use crate::models::{Pricelist, PricelistSearchCriteria, SearchCriteria};
use crate::storage::PricingStores;
use std::sync::Arc;

/// Paged source of exportable price lists.
pub type PricelistExportPagedDataSource = ExportPagedDataSource<Pricelist, ExportablePricelist>;

impl ExportPagedDataSource<Pricelist, ExportablePricelist> {
    /// Creates a source over the price list store.
    #[must_use]
    pub fn new(stores: &PricingStores, query: ExportDataQuery) -> Self {
        Self::from_parts(
            query,
            PageFetcher::new(Arc::clone(&stores.pricelists)),
            Enricher::projecting(),
            pricelist_criteria,
        )
    }
}

fn pricelist_criteria(query: &ExportDataQuery, base: SearchCriteria) -> PricelistSearchCriteria {
    PricelistSearchCriteria {
        base,
        currencies: query.currencies.clone(),
    }
}
