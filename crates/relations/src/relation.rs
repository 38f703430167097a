use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, EntityId, Money, RelationId, RelationTypeId};

/// Tag identifying a kind of catalog entity (e.g. `"catalog.product"`).
///
/// Kinds are opaque strings so any entity type can participate without this
/// crate enumerating them. Participating types expose their tag as an
/// associated `KIND` constant (see [`crate::source::RelatableEntity`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKind(Cow<'static, str>);

impl EntityKind {
    pub const fn from_static(tag: &'static str) -> Self {
        Self(Cow::Borrowed(tag))
    }

    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Polymorphic entity reference: kind tag + id.
///
/// Either side of a relation may be of a different concrete entity type, so
/// rows reference entities by this pair rather than by typed id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

impl core::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A named classification of relations, scoped to one owning entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationType {
    pub id: RelationTypeId,
    pub name: String,
    /// Which entity kind may own relations of this type.
    pub applies_to: EntityKind,
}

impl RelationType {
    pub fn new(name: impl Into<String>, applies_to: EntityKind) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("relation type name cannot be empty"));
        }
        Ok(Self {
            id: RelationTypeId::new(),
            name,
            applies_to,
        })
    }
}

/// A directed, typed, ordered edge between two entities.
///
/// `relatable` owns the edge; `related_to` is its target. `position` orders
/// edges sharing the same `(relatable, relation_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub relation_type_id: RelationTypeId,
    pub relatable: EntityRef,
    pub related_to: EntityRef,
    pub discount_amount: Option<Money>,
    pub position: i32,
}

impl Relation {
    /// The uniqueness key for the duplicate-edge invariant.
    ///
    /// Deliberately id-only: kind tags are omitted, matching the scope the
    /// original data was written under.
    pub fn unique_key(&self) -> (EntityId, EntityId, RelationTypeId) {
        (self.relatable.id, self.related_to.id, self.relation_type_id)
    }
}

/// Payload for creating a relation.
///
/// When `position` is `None` the store appends after the current maximum for
/// `(relatable, relation_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelation {
    pub relation_type_id: RelationTypeId,
    pub relatable: EntityRef,
    pub related_to: EntityRef,
    pub discount_amount: Option<Money>,
    pub position: Option<i32>,
}

/// Partial update of a relation.
///
/// `discount_amount` is doubly optional: `None` leaves the discount alone,
/// `Some(None)` clears it, `Some(Some(m))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationUpdate {
    pub related_to: Option<EntityRef>,
    pub discount_amount: Option<Option<Money>>,
    pub position: Option<i32>,
}

impl RelationUpdate {
    pub fn is_empty(&self) -> bool {
        self.related_to.is_none() && self.discount_amount.is_none() && self.position.is_none()
    }

    /// Apply this update to a relation in place.
    pub fn apply(&self, relation: &mut Relation) {
        if let Some(target) = &self.related_to {
            relation.related_to = target.clone();
        }
        if let Some(discount) = &self.discount_amount {
            relation.discount_amount = *discount;
        }
        if let Some(position) = self.position {
            relation.position = position;
        }
    }
}
