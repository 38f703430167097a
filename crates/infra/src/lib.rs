//! Infrastructure layer: in-memory storage implementations.
//!
//! Everything here mirrors the production storage contract (invariants
//! enforced inside the storage layer, atomic batches) but keeps state in
//! process. Intended for tests/dev; a SQL tier implements the same traits
//! against real tables.

pub mod catalog;
pub mod relation_store;
pub mod relation_types;

pub use catalog::{InMemoryCatalog, ProductSource, VariantSource};
pub use relation_store::InMemoryRelationStore;
pub use relation_types::InMemoryRelationTypeRegistry;
