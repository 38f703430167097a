use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, EntityId, Money};
use storefront_relations::{EntityKind, EntityRef, EntitySnapshot, RelatableEntity};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A sellable catalog product.
///
/// Only the attributes the relation feature filters on are modelled here:
/// availability, soft-deletion, price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    sku: String,
    price: Money,
    available_on: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        sku: impl Into<String>,
        price: Money,
        available_on: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let sku = sku.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            sku,
            price,
            available_on,
            deleted_at: None,
            updated_at: created_at,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn available_on(&self) -> Option<DateTime<Utc>> {
        self.available_on
    }

    /// Available products have a non-null availability date in the past.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.available_on.is_some_and(|at| at <= now)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Mark the product soft-deleted.
    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    /// Bump the modification timestamp without changing anything else.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl RelatableEntity for Product {
    const KIND: EntityKind = EntityKind::from_static("catalog.product");

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id.0)
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            entity: self.entity_ref(),
            name: self.name.clone(),
            price: self.price,
        }
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Products tighten the default filter: a related product must also be
    /// available (non-null availability date, not in the future).
    fn visible_for_relations(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && self.is_available(now)
    }
}
