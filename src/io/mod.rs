//! Export and import of pricing data.
//!
//! # Architecture
//!
//! - **Data sources** ([`datasource`]) fetch, enrich and order one page of
//!   exportable records per call
//! - **Paging** ([`paging`]) drives a source window by window
//! - **Engines** ([`services`]) stream the archive in either direction and
//!   export single kinds
//! - **Formats** ([`formats`]) write JSON and CSV
//!
//! # Archive format
//!
//! One JSON object with the sections written in this order:
//!
//! ```json
//! {"Pricelists":[...],"Assignments":[...],"Prices":[...]}
//! ```
//!
//! # Examples
//!
//! ```rust
//! use pricing_transfer::{
//!     CancellationToken, InMemoryPricingStore, Pricelist, PricingExportImport, PricingStores,
//!     StaticSettings,
//! };
//! use pricing_transfer::storage::EntityStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryPricingStore::new());
//! EntityStore::<Pricelist>::save(&*store, &[Pricelist::new("pl1", "Retail", "USD")])?;
//! let engine = PricingExportImport::new(
//!     PricingStores::from_backend(store),
//!     Arc::new(StaticSettings::new()),
//! );
//!
//! let mut archive = Vec::new();
//! let summary = engine.export(&mut archive, |_| {}, &CancellationToken::new())?;
//! assert_eq!(summary.pricelists, 1);
//! # Ok::<(), pricing_transfer::Error>(())
//! ```

pub mod cancellation;
pub mod datasource;
pub mod formats;
pub mod paging;
pub mod progress;
pub mod services;
pub mod traits;

// Re-exports for convenience
pub use cancellation::CancellationToken;
pub use datasource::{
    ExportDataQuery, PriceExportPagedDataSource, PricelistAssignmentExportPagedDataSource,
    PricelistExportPagedDataSource,
};
pub use formats::Format;
pub use progress::ProgressInfo;
pub use services::{DataExporter, ExportSummary, ImportSummary, PricingExportImport};
pub use traits::{
    ExportRecord, ExportSink, ExportablePrice, ExportablePricelist, ExportablePricelistAssignment,
    PagedDataSource,
};
