//! Export and import engines.
//!
//! [`PricingExportImport`] moves the full archive in both directions.
//! [`DataExporter`] exports a single kind selected by a query.

mod data_export;
mod export;
mod import;

pub use data_export::DataExporter;

use super::paging;
use crate::config::SettingsManager;
use crate::models::EntityKind;
use crate::storage::PricingStores;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Records moved per section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SectionCounts {
    /// Price lists.
    pub pricelists: usize,
    /// Price list assignments.
    pub assignments: usize,
    /// Prices.
    pub prices: usize,
}

/// Result of a full export.
pub type ExportSummary = SectionCounts;

/// Result of a full import.
pub type ImportSummary = SectionCounts;

impl SectionCounts {
    /// Returns the count for `kind`.
    #[must_use]
    pub const fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Pricelist => self.pricelists,
            EntityKind::Assignment => self.assignments,
            EntityKind::Price => self.prices,
        }
    }

    /// Returns the count over all sections.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pricelists + self.assignments + self.prices
    }

    /// Adds `n` to the count for `kind` and returns the new count.
    pub(crate) fn add(&mut self, kind: EntityKind, n: usize) -> usize {
        let slot = match kind {
            EntityKind::Pricelist => &mut self.pricelists,
            EntityKind::Assignment => &mut self.assignments,
            EntityKind::Price => &mut self.prices,
        };
        *slot += n;
        *slot
    }
}

/// Full-archive export and import over the pricing stores.
///
/// The batch size is read from the settings collaborator on first use and
/// is fixed for the lifetime of the instance.
pub struct PricingExportImport {
    stores: PricingStores,
    settings: Arc<dyn SettingsManager>,
    batch_size: OnceLock<usize>,
}

impl PricingExportImport {
    /// Creates an engine over `stores`.
    #[must_use]
    pub fn new(stores: PricingStores, settings: Arc<dyn SettingsManager>) -> Self {
        Self {
            stores,
            settings,
            batch_size: OnceLock::new(),
        }
    }

    /// Returns the page and batch size, resolving it on first call.
    pub fn batch_size(&self) -> usize {
        *self
            .batch_size
            .get_or_init(|| paging::batch_size_from_settings(&*self.settings))
    }

    /// Returns the store collaborators.
    #[must_use]
    pub const fn stores(&self) -> &PricingStores {
        &self.stores
    }
}

impl std::fmt::Debug for PricingExportImport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingExportImport")
            .field("batch_size", &self.batch_size.get())
            .finish_non_exhaustive()
    }
}
