//! In-memory relation store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use storefront_core::{RelationId, RelationTypeId};
use storefront_relations::{
    EntityRef, NewRelation, OwnerTouch, Relation, RelationStore, RelationUpdate, StoreError,
};

/// In-memory [`RelationStore`].
///
/// Intended for tests/dev. The duplicate-edge invariant and position
/// assignment run inside a single write-locked critical section, which is
/// this build's equivalent of the unique index a SQL tier relies on.
pub struct InMemoryRelationStore {
    relations: RwLock<HashMap<RelationId, Relation>>,
    touch: Option<Arc<dyn OwnerTouch>>,
}

impl InMemoryRelationStore {
    pub fn new() -> Self {
        Self {
            relations: RwLock::new(HashMap::new()),
            touch: None,
        }
    }

    /// Store that reports owner mutations to the given sink.
    pub fn with_touch(touch: Arc<dyn OwnerTouch>) -> Self {
        Self {
            relations: RwLock::new(HashMap::new()),
            touch: Some(touch),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn touch_owner(&self, owner: &EntityRef) {
        if let Some(touch) = &self.touch {
            touch.touch(owner, Utc::now());
        }
    }

    /// Duplicate-edge check on the id-only scope
    /// `(relatable_id, related_to_id, relation_type_id)`.
    fn duplicate_exists(
        relations: &HashMap<RelationId, Relation>,
        candidate: &Relation,
        exclude: Option<RelationId>,
    ) -> bool {
        relations.values().any(|existing| {
            Some(existing.id) != exclude && existing.unique_key() == candidate.unique_key()
        })
    }

    /// Next free position within `(relatable, relation_type)`.
    fn next_position(
        relations: &HashMap<RelationId, Relation>,
        owner: &EntityRef,
        relation_type: RelationTypeId,
    ) -> i32 {
        relations
            .values()
            .filter(|r| r.relatable == *owner && r.relation_type_id == relation_type)
            .map(|r| r.position)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }
}

impl Default for InMemoryRelationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryRelationStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let len = self.relations.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("InMemoryRelationStore")
            .field("relations", &len)
            .finish()
    }
}

impl RelationStore for InMemoryRelationStore {
    fn get(&self, id: RelationId) -> Result<Option<Relation>, StoreError> {
        let relations = self
            .relations
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(relations.get(&id).cloned())
    }

    fn create(&self, new: NewRelation) -> Result<Relation, StoreError> {
        let relation = {
            let mut relations = self
                .relations
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

            let position = new.position.unwrap_or_else(|| {
                Self::next_position(&relations, &new.relatable, new.relation_type_id)
            });
            let relation = Relation {
                id: RelationId::new(),
                relation_type_id: new.relation_type_id,
                relatable: new.relatable,
                related_to: new.related_to,
                discount_amount: new.discount_amount,
                position,
            };

            if Self::duplicate_exists(&relations, &relation, None) {
                return Err(StoreError::Validation(format!(
                    "relation from {} to {} of this type already exists",
                    relation.relatable, relation.related_to
                )));
            }

            relations.insert(relation.id, relation.clone());
            relation
        };

        self.touch_owner(&relation.relatable);
        Ok(relation)
    }

    fn update(&self, id: RelationId, update: RelationUpdate) -> Result<Relation, StoreError> {
        let updated = {
            let mut relations = self
                .relations
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

            let Some(current) = relations.get(&id) else {
                return Err(StoreError::NotFound(id));
            };

            let mut updated = current.clone();
            update.apply(&mut updated);

            if Self::duplicate_exists(&relations, &updated, Some(id)) {
                return Err(StoreError::Validation(format!(
                    "relation from {} to {} of this type already exists",
                    updated.relatable, updated.related_to
                )));
            }

            relations.insert(id, updated.clone());
            updated
        };

        self.touch_owner(&updated.relatable);
        Ok(updated)
    }

    fn destroy(&self, id: RelationId) -> Result<Relation, StoreError> {
        let removed = {
            let mut relations = self
                .relations
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
            relations.remove(&id).ok_or(StoreError::NotFound(id))?
        };

        self.touch_owner(&removed.relatable);
        Ok(removed)
    }

    fn reorder(
        &self,
        owner: &EntityRef,
        positions: &[(RelationId, i32)],
    ) -> Result<(), StoreError> {
        let mut relations = self
            .relations
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        // Validate the whole batch before writing anything: one foreign or
        // unknown id rejects it all.
        for (id, _) in positions {
            match relations.get(id) {
                Some(relation) if relation.relatable == *owner => {}
                Some(_) => {
                    return Err(StoreError::Validation(format!(
                        "relation {id} does not belong to {owner}"
                    )));
                }
                None => {
                    return Err(StoreError::Validation(format!("unknown relation {id}")));
                }
            }
        }

        for (id, position) in positions {
            if let Some(relation) = relations.get_mut(id) {
                relation.position = *position;
            }
        }

        // No touch here: positions are applied as a raw bulk update.
        Ok(())
    }

    fn list_for_owner(
        &self,
        owner: &EntityRef,
        relation_type: Option<RelationTypeId>,
    ) -> Result<Vec<Relation>, StoreError> {
        let relations = self
            .relations
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        let mut rows: Vec<Relation> = relations
            .values()
            .filter(|r| r.relatable == *owner)
            .filter(|r| relation_type.is_none_or(|rt| r.relation_type_id == rt))
            .cloned()
            .collect();
        // Position order; v7 ids break ties in creation order.
        rows.sort_by_key(|r| (r.position, r.id));
        Ok(rows)
    }

    fn destroy_where_owner(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
        let removed = {
            let mut relations = self
                .relations
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

            let ids: Vec<RelationId> = relations
                .values()
                .filter(|r| r.relatable == *entity)
                .map(|r| r.id)
                .collect();
            let mut removed: Vec<Relation> =
                ids.iter().filter_map(|id| relations.remove(id)).collect();
            removed.sort_by_key(|r| (r.position, r.id));
            removed
        };

        tracing::debug!(entity = %entity, count = removed.len(), "cascaded relations owned by entity");
        for relation in &removed {
            self.touch_owner(&relation.relatable);
        }
        Ok(removed)
    }

    fn destroy_where_target(&self, entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
        let removed = {
            let mut relations = self
                .relations
                .write()
                .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

            let ids: Vec<RelationId> = relations
                .values()
                .filter(|r| r.related_to == *entity)
                .map(|r| r.id)
                .collect();
            let mut removed: Vec<Relation> =
                ids.iter().filter_map(|id| relations.remove(id)).collect();
            removed.sort_by_key(|r| (r.position, r.id));
            removed
        };

        tracing::debug!(entity = %entity, count = removed.len(), "cascaded relations targeting entity");
        // The surviving owners on the other end of these edges just lost an
        // association; their caches must invalidate.
        for relation in &removed {
            self.touch_owner(&relation.relatable);
        }
        Ok(removed)
    }
}
