//! Entity store trait.

use crate::Result;
use crate::models::{Criteria, Entity, Page};

/// Generic persistence capability for one entity kind.
///
/// Stores are the authoritative source of truth for pricing entities. The
/// transfer engines only read pages, read by id and upsert batches.
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Fetches the entities with the given ids.
    ///
    /// Unknown ids are skipped. The result order is the store's own order,
    /// not the order of `ids`.
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<T>>;

    /// Returns one page of entities matching `criteria`, ordered by id.
    fn search(&self, criteria: &T::Criteria) -> Result<Page<T>>;

    /// Inserts or replaces entities by id.
    ///
    /// Transient entities (empty id) receive a fresh identity. A batch is
    /// applied as a unit.
    fn save(&self, items: &[T]) -> Result<()>;

    /// Deletes entities by id. Unknown ids are ignored.
    fn delete(&self, ids: &[String]) -> Result<()>;

    /// Returns the number of stored entities.
    fn count(&self) -> Result<usize> {
        let mut criteria = T::Criteria::default();
        criteria.base_mut().take = 0;
        Ok(self.search(&criteria)?.total_count)
    }
}
