//! Price list assignment export source.
//!
//! Assignments are stamped with the names of their catalog and price list.

use super::{Enricher, ExportDataQuery, ExportPagedDataSource, PageFetcher, Relation};
use crate::io::traits::ExportablePricelistAssignment;
use crate::models::{PricelistAssignment, PricelistAssignmentsSearchCriteria, SearchCriteria};
use crate::storage::PricingStores;
use std::sync::Arc;

/// Paged source of exportable assignments.
pub type PricelistAssignmentExportPagedDataSource =
    ExportPagedDataSource<PricelistAssignment, ExportablePricelistAssignment>;

impl ExportPagedDataSource<PricelistAssignment, ExportablePricelistAssignment> {
    /// Creates a source over the assignment store, resolving names through
    /// the catalog service and the price list store.
    #[must_use]
    pub fn new(stores: &PricingStores, query: ExportDataQuery) -> Self {
        let enricher = Enricher::projecting()
            .with_relation(Relation::catalog_names(
                Arc::clone(&stores.catalogs),
                catalog_id,
                stamp_catalog_name,
            ))
            .with_relation(Relation::pricelist_names(
                Arc::clone(&stores.pricelists),
                pricelist_id,
                stamp_pricelist_name,
            ));

        Self::from_parts(
            query,
            PageFetcher::new(Arc::clone(&stores.assignments)),
            enricher,
            assignment_criteria,
        )
    }
}

fn assignment_criteria(
    query: &ExportDataQuery,
    base: SearchCriteria,
) -> PricelistAssignmentsSearchCriteria {
    PricelistAssignmentsSearchCriteria {
        base,
        pricelist_ids: query.pricelist_ids.clone(),
        catalog_ids: query.catalog_ids.clone(),
    }
}

fn catalog_id(assignment: &PricelistAssignment) -> &str {
    &assignment.catalog_id
}

fn pricelist_id(assignment: &PricelistAssignment) -> &str {
    &assignment.pricelist_id
}

fn stamp_catalog_name(exportable: &mut ExportablePricelistAssignment, name: String) {
    exportable.catalog_name = Some(name);
}

fn stamp_pricelist_name(exportable: &mut ExportablePricelistAssignment, name: String) {
    exportable.pricelist_name = Some(name);
}
