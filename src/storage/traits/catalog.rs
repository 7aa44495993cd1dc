//! Catalog lookup trait.

use crate::Result;
use crate::models::Catalog;

/// Bulk catalog lookup used to denormalize catalog names on export.
pub trait CatalogService: Send + Sync {
    /// Fetches the catalogs with the given ids. Unknown ids are skipped.
    fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Catalog>>;
}
