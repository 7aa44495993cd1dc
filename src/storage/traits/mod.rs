//! Storage collaborator traits.

mod catalog;
mod persistence;

pub use catalog::CatalogService;
pub use persistence::EntityStore;
