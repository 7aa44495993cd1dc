//! Pricing store implementations.

mod memory;
mod sqlite;

pub use memory::InMemoryPricingStore;
pub use sqlite::SqlitePricingStore;
