//! `storefront-catalog` — the catalog entity types participating in
//! relations, and the admin-facing service over them.

pub mod admin;
pub mod product;
pub mod variant;

pub use admin::{AddRelation, AdminError, CatalogRelations, CatalogStore, StandardShelves};
pub use product::{Product, ProductId};
pub use variant::{Variant, VariantId};
