//! Page fetcher.

use crate::models::{Criteria, Entity, Page};
use crate::storage::EntityStore;
use crate::{Error, Result};
use std::sync::Arc;

/// Reads one page of raw entities for a data source.
///
/// When the criteria carry at least one non-blank object id the ids are
/// fetched directly and the window is ignored; `total_count` is then the
/// number of entities found. The order of a fetch by ids is whatever the
/// store returns.
pub struct PageFetcher<T: Entity> {
    store: Arc<dyn EntityStore<T>>,
}

impl<T: Entity> PageFetcher<T> {
    /// Creates a fetcher over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore<T>>) -> Self {
        Self { store }
    }

    /// Fetches the page described by `criteria`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FetchFailed`] if the store fails.
    pub fn fetch(&self, criteria: &T::Criteria) -> Result<Page<T>> {
        let base = criteria.base();
        let entity = T::KIND.as_str();

        if base.has_object_ids() {
            let results = self
                .store
                .get_by_ids(&base.requested_ids())
                .map_err(|e| Error::fetch(entity, e))?;
            let total_count = results.len();
            return Ok(Page::new(results, total_count));
        }

        self.store
            .search(criteria)
            .map_err(|e| Error::fetch(entity, e))
    }
}
