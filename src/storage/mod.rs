//! Storage layer abstraction.
//!
//! Every pricing kind sits behind one generic [`EntityStore`] trait, and
//! catalogs behind [`CatalogService`]. Two backends implement all of them:
//! - [`InMemoryPricingStore`]: non-persistent, for tests and embedding
//! - [`SqlitePricingStore`]: durable `SQLite` storage

// Dropping the connection guard slightly early provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use persistence::{InMemoryPricingStore, SqlitePricingStore};
pub use traits::{CatalogService, EntityStore};

use crate::models::{Price, Pricelist, PricelistAssignment};
use std::sync::Arc;

/// The store collaborators used by a transfer.
///
/// Each field can point at a different backend; tests typically wrap one
/// field to inject failures.
#[derive(Clone)]
pub struct PricingStores {
    /// Price list store.
    pub pricelists: Arc<dyn EntityStore<Pricelist>>,
    /// Assignment store.
    pub assignments: Arc<dyn EntityStore<PricelistAssignment>>,
    /// Price store.
    pub prices: Arc<dyn EntityStore<Price>>,
    /// Catalog lookup.
    pub catalogs: Arc<dyn CatalogService>,
}

impl PricingStores {
    /// Uses one backend for every collaborator.
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: EntityStore<Pricelist>
            + EntityStore<PricelistAssignment>
            + EntityStore<Price>
            + CatalogService
            + 'static,
    {
        Self {
            pricelists: backend.clone(),
            assignments: backend.clone(),
            prices: backend.clone(),
            catalogs: backend,
        }
    }
}

impl std::fmt::Debug for PricingStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingStores").finish_non_exhaustive()
    }
}
