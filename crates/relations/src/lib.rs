//! `storefront-relations` — typed, directional, ordered relationships
//! between catalog entities.
//!
//! A [`Relation`] is a directed edge from an owner entity to a target entity,
//! classified by a [`RelationType`] ("Upsell", "Also Bought", ...), ordered by
//! position, and optionally carrying a discount. The [`RelationResolver`]
//! turns `(owner, relation-type name)` into the ordered, visibility-filtered
//! list of related entities.

pub mod naming;
pub mod registry;
pub mod relation;
pub mod resolver;
pub mod source;
pub mod store;

pub use registry::{RegistryError, RelationTypeRegistry};
pub use relation::{EntityKind, EntityRef, NewRelation, Relation, RelationType, RelationUpdate};
pub use resolver::{RelationResolver, ResolveError, Resolution};
pub use source::{EntitySnapshot, EntitySource, OwnerTouch, RelatableEntity, SourceRegistry};
pub use store::{RelationStore, StoreError};
