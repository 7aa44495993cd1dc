//! # pricing-transfer
//!
//! Streaming export and import of pricing data: price lists, price list
//! assignments and prices.
//!
//! The crate moves arbitrarily large pricing datasets between a store and a
//! portable JSON archive without holding more than one page (export) or one
//! batch (import) in memory.
//!
//! ## Features
//!
//! - Paged export data sources that enrich raw records with related display
//!   names in one bulk lookup per page
//! - Streaming archive writer (`Pricelists`, `Assignments`, `Prices`)
//! - Streaming archive reader that saves in batches and tolerates unknown,
//!   missing or reordered sections
//! - Cooperative cancellation and per-page progress reporting
//! - In-memory and `SQLite` stores behind one generic [`EntityStore`] trait
//!
//! ## Example
//!
//! ```rust,ignore
//! use pricing_transfer::{CancellationToken, PricingExportImport, PricingStores, StaticSettings};
//!
//! let engine = PricingExportImport::new(stores, Arc::new(StaticSettings::default()));
//! let summary = engine.export(file, |progress| println!("{progress}"), &CancellationToken::new())?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::{PricingConfig, SettingsManager, StaticSettings};
pub use io::{
    CancellationToken, DataExporter, ExportDataQuery, ExportSummary, ImportSummary,
    PricingExportImport, ProgressInfo,
};
pub use models::{
    Catalog, Entity, EntityKind, Page, Price, Pricelist, PricelistAssignment, SearchCriteria,
};
pub use storage::{
    CatalogService, EntityStore, InMemoryPricingStore, PricingStores, SqlitePricingStore,
};

/// Error type for pricing transfer operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Cancelled` | The cancellation token was signaled at a page or batch boundary |
/// | `FetchFailed` | A search, get-by-ids or related-entity lookup failed during export |
/// | `SaveFailed` | A bulk save was rejected during import |
/// | `DecodeFailed` | The archive is not a JSON object or an element has the wrong shape |
/// | `InvalidInput` | Unknown format, entity kind or malformed CLI/config values |
/// | `OperationFailed` | I/O, `SQLite`, config parsing, observability setup |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The operation was cancelled cooperatively.
    ///
    /// Raised before any work starts when the token is already signaled, or
    /// between pages/batches once the in-flight one has finished.
    #[error("operation cancelled")]
    Cancelled,

    /// A store collaborator failed while reading.
    #[error("failed to fetch {entity}: {cause}")]
    FetchFailed {
        /// The entity kind being fetched.
        entity: String,
        /// The underlying cause.
        cause: String,
    },

    /// A store collaborator rejected a batch.
    ///
    /// Batches saved before the failure stay persisted.
    #[error("failed to save {entity}: {cause}")]
    SaveFailed {
        /// The entity kind being saved.
        entity: String,
        /// The underlying cause.
        cause: String,
    },

    /// The archive could not be decoded.
    #[error("failed to decode archive: {0}")]
    DecodeFailed(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns `true` for [`Error::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Wraps a collaborator error raised while fetching `entity`.
    ///
    /// Cancellation passes through unchanged.
    #[must_use]
    pub fn fetch(entity: impl Into<String>, source: Self) -> Self {
        match source {
            Self::Cancelled => Self::Cancelled,
            other @ Self::FetchFailed { .. } => other,
            other => Self::FetchFailed {
                entity: entity.into(),
                cause: other.to_string(),
            },
        }
    }

    /// Wraps a collaborator error raised while saving `entity`.
    #[must_use]
    pub fn save(entity: impl Into<String>, source: Self) -> Self {
        match source {
            Self::Cancelled => Self::Cancelled,
            other @ Self::SaveFailed { .. } => other,
            other => Self::SaveFailed {
                entity: entity.into(),
                cause: other.to_string(),
            },
        }
    }
}

/// Result type alias for pricing transfer operations.
pub type Result<T> = std::result::Result<T, Error>;
