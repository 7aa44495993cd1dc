//! Price export source.

use super::{Enricher, ExportDataQuery, ExportPagedDataSource, PageFetcher, Relation};
use crate::io::traits::ExportablePrice;
use crate::models::{Price, PricesSearchCriteria, SearchCriteria};
use crate::storage::PricingStores;
use std::sync::Arc;

/// Paged source of exportable prices.
pub type PriceExportPagedDataSource = ExportPagedDataSource<Price, ExportablePrice>;

impl ExportPagedDataSource<Price, ExportablePrice> {
    /// Creates a source over the price store, stamping price list names.
    #[must_use]
    pub fn new(stores: &PricingStores, query: ExportDataQuery) -> Self {
        Self::from_parts(
            query,
            PageFetcher::new(Arc::clone(&stores.prices)),
            Enricher::projecting().with_relation(Relation::pricelist_names(
                Arc::clone(&stores.pricelists),
                pricelist_id,
                stamp_pricelist_name,
            )),
            price_criteria,
        )
    }
}

fn price_criteria(query: &ExportDataQuery, base: SearchCriteria) -> PricesSearchCriteria {
    PricesSearchCriteria {
        base,
        pricelist_ids: query.pricelist_ids.clone(),
        product_ids: query.product_ids.clone(),
    }
}

fn pricelist_id(price: &Price) -> &str {
    &price.pricelist_id
}

fn stamp_pricelist_name(exportable: &mut ExportablePrice, name: String) {
    exportable.pricelist_name = Some(name);
}
