use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, EntityId, Money};
use storefront_relations::{EntityKind, EntityRef, EntitySnapshot, RelatableEntity};

use crate::product::ProductId;

/// Variant identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub EntityId);

impl VariantId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VariantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A concrete purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    id: VariantId,
    product_id: ProductId,
    sku: String,
    price: Money,
    deleted_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl Variant {
    pub fn new(
        id: VariantId,
        product_id: ProductId,
        sku: impl Into<String>,
        price: Money,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }
        Ok(Self {
            id,
            product_id,
            sku,
            price,
            deleted_at: None,
            updated_at: created_at,
        })
    }

    pub fn id_typed(&self) -> VariantId {
        self.id
    }

    /// The owning product.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
        self.updated_at = at;
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl Entity for Variant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Variants keep the default visibility filter: soft-deleted variants are
// hidden, everything else shows.
impl RelatableEntity for Variant {
    const KIND: EntityKind = EntityKind::from_static("catalog.variant");

    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(Self::KIND, self.id.0)
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            entity: self.entity_ref(),
            name: self.sku.clone(),
            price: self.price,
        }
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}
