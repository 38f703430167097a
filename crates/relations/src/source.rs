//! The entity capability boundary.
//!
//! Any entity type can participate in relations by implementing
//! [`RelatableEntity`] and registering an [`EntitySource`] for its kind. The
//! engine only ever talks to targets through these interfaces.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, EntityId, Money};

use crate::relation::{EntityKind, EntityRef};
use crate::store::StoreError;

/// Presentation view of a related entity, as returned by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity: EntityRef,
    pub name: String,
    pub price: Money,
}

/// Capability an entity type attaches to participate in relations.
///
/// Supplies the type's kind tag, its polymorphic reference, a presentation
/// snapshot, and the type's default visibility predicate for relation
/// targets.
pub trait RelatableEntity: Entity {
    /// The kind tag rows of this type carry in polymorphic references.
    const KIND: EntityKind;

    fn entity_ref(&self) -> EntityRef;

    fn snapshot(&self) -> EntitySnapshot;

    /// Soft-deletion marker.
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Whether this entity may be surfaced as a relation target.
    ///
    /// The default excludes soft-deleted entities. Types override this to
    /// tighten the filter, e.g. a product may additionally require a
    /// non-null availability date in the past. The predicate expresses "is
    /// this candidate presentable", so it always belongs to the *target's*
    /// type, never the owner's.
    fn visible_for_relations(&self, _now: DateTime<Utc>) -> bool {
        self.deleted_at().is_none()
    }
}

/// Query capability for one entity kind.
///
/// The resolution engine addresses targets by kind tag; each participating
/// type registers one of these in the [`SourceRegistry`].
pub trait EntitySource: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Snapshots for the given ids within the type's default scope, with the
    /// type's relation filter applied. Missing and filtered-out ids are
    /// simply absent; order is unspecified and callers re-impose their own.
    fn load_visible(
        &self,
        ids: &[EntityId],
        now: DateTime<Utc>,
    ) -> Result<Vec<EntitySnapshot>, StoreError>;

    /// Unfiltered snapshot lookup (used for pricing, where a hidden target
    /// still has a base price).
    fn load(&self, id: EntityId) -> Result<Option<EntitySnapshot>, StoreError>;
}

/// Registry mapping an entity kind tag to its query capability.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<EntityKind, Arc<dyn EntitySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source under its own kind. Re-registering a kind replaces
    /// the previous source.
    pub fn register(&mut self, source: Arc<dyn EntitySource>) {
        self.sources.insert(source.kind(), source);
    }

    pub fn get(&self, kind: &EntityKind) -> Option<&Arc<dyn EntitySource>> {
        self.sources.get(kind)
    }
}

impl core::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("kinds", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Sink for owner "last modified" bumps.
///
/// Mutating a relation touches its owner so downstream caches keyed on the
/// owner's timestamp invalidate. Stores hold one of these and call it after
/// each mutation.
pub trait OwnerTouch: Send + Sync {
    fn touch(&self, entity: &EntityRef, at: DateTime<Utc>);
}
