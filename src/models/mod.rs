//! Data models for pricing transfer.
//!
//! - [`pricing`]: the stored entities (price lists, assignments, prices) and
//!   the catalog reference used for enrichment
//! - [`search`]: search criteria and result pages

pub mod pricing;
pub mod search;

pub use pricing::{Catalog, Entity, EntityKind, Price, Pricelist, PricelistAssignment};
pub use search::{
    Criteria, Page, PricelistAssignmentsSearchCriteria, PricelistSearchCriteria,
    PricesSearchCriteria, SearchCriteria,
};
