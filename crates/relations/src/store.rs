//! Relation store abstraction.

use std::sync::Arc;

use thiserror::Error;

use storefront_core::{RelationId, RelationTypeId};

use crate::relation::{EntityRef, NewRelation, Relation, RelationUpdate};

/// Relation store operation error.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Missing required data or a uniqueness violation.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("relation not found: {0}")]
    NotFound(RelationId),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Durable records of directed, typed links between two entities.
///
/// No business logic lives here, only persistence plus invariant
/// enforcement. The duplicate-edge invariant (one edge per
/// `(relatable_id, related_to_id, relation_type_id)`) must be enforced by
/// the storage layer itself (a unique index, or a single critical section
/// in an in-memory build), never by a check-then-insert at the call site,
/// which races under concurrent requests.
///
/// Mutations touch the owning entity's modification timestamp (see
/// [`crate::source::OwnerTouch`]); `reorder` is the exception, it is applied
/// as a raw bulk update.
pub trait RelationStore: Send + Sync {
    /// Look up a relation by id.
    fn get(&self, id: RelationId) -> Result<Option<Relation>, StoreError>;

    /// Persist a new relation.
    ///
    /// Fails with `Validation` if an edge with the same
    /// `(relatable_id, related_to_id, relation_type_id)` already exists.
    /// Without an explicit position, appends after the current maximum for
    /// `(relatable, relation_type)`.
    fn create(&self, new: NewRelation) -> Result<Relation, StoreError>;

    /// Apply a partial update.
    ///
    /// Fails with `NotFound` if the id is absent and `Validation` if the
    /// update would violate the duplicate-edge invariant.
    fn update(&self, id: RelationId, update: RelationUpdate) -> Result<Relation, StoreError>;

    /// Remove a relation, returning the removed row.
    ///
    /// A destroy racing a prior destroy surfaces `NotFound`; the owner's
    /// remaining collection is unaffected either way.
    fn destroy(&self, id: RelationId) -> Result<Relation, StoreError>;

    /// Bulk-set positions in one atomic batch.
    ///
    /// Every id must belong to a relation owned by `owner`; a single foreign
    /// or unknown id rejects the whole batch with `Validation` before any
    /// position is written.
    fn reorder(
        &self,
        owner: &EntityRef,
        positions: &[(RelationId, i32)],
    ) -> Result<(), StoreError>;

    /// Relations owned by `owner`, optionally restricted to one type,
    /// position ascending.
    fn list_for_owner(
        &self,
        owner: &EntityRef,
        relation_type: Option<RelationTypeId>,
    ) -> Result<Vec<Relation>, StoreError>;

    /// First phase of cascading destroy: remove every relation `entity` owns.
    fn destroy_where_owner(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError>;

    /// Second phase of cascading destroy: remove every relation targeting
    /// `entity`, so no dangling polymorphic reference survives.
    fn destroy_where_target(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError>;
}

impl<S> RelationStore for Arc<S>
where
    S: RelationStore + ?Sized,
{
    fn get(&self, id: RelationId) -> Result<Option<Relation>, StoreError> {
        (**self).get(id)
    }

    fn create(&self, new: NewRelation) -> Result<Relation, StoreError> {
        (**self).create(new)
    }

    fn update(&self, id: RelationId, update: RelationUpdate) -> Result<Relation, StoreError> {
        (**self).update(id, update)
    }

    fn destroy(&self, id: RelationId) -> Result<Relation, StoreError> {
        (**self).destroy(id)
    }

    fn reorder(
        &self,
        owner: &EntityRef,
        positions: &[(RelationId, i32)],
    ) -> Result<(), StoreError> {
        (**self).reorder(owner, positions)
    }

    fn list_for_owner(
        &self,
        owner: &EntityRef,
        relation_type: Option<RelationTypeId>,
    ) -> Result<Vec<Relation>, StoreError> {
        (**self).list_for_owner(owner, relation_type)
    }

    fn destroy_where_owner(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
        (**self).destroy_where_owner(entity)
    }

    fn destroy_where_target(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
        (**self).destroy_where_target(entity)
    }
}
