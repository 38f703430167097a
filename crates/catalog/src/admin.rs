//! Admin-facing operations over catalog relations.
//!
//! Thin glue: every operation maps 1:1 onto a store or engine call. The one
//! piece of real logic is target coercion on create: the admin UI always
//! supplies variants (that is what its search returns), but a product-scoped
//! relation type links products, so the chosen variant resolves to its
//! owning product.

use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_core::{RelationId, RelationTypeId, Money};
use storefront_relations::{
    EntityKind, EntityRef, NewRelation, RegistryError, Relation, RelationResolver,
    RelationTypeRegistry, RelationStore, RelationUpdate, ResolveError, Resolution, StoreError,
    relation_accessors,
};

use crate::product::{Product, ProductId};
use crate::variant::{Variant, VariantId};
use storefront_relations::RelatableEntity;

relation_accessors!(pub StandardShelves {
    accessories => "Accessory",
    also_boughts => "Also Bought",
    upsells => "Upsell",
});

/// Lookup + lifecycle access to the catalog's entities.
pub trait CatalogStore: Send + Sync {
    fn product(&self, id: ProductId) -> Option<Product>;
    fn variant(&self, id: VariantId) -> Option<Variant>;
    /// Soft-delete; returns false when the id is unknown.
    fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> bool;
    fn soft_delete_variant(&self, id: VariantId, at: DateTime<Utc>) -> bool;
}

impl<C> CatalogStore for std::sync::Arc<C>
where
    C: CatalogStore + ?Sized,
{
    fn product(&self, id: ProductId) -> Option<Product> {
        (**self).product(id)
    }

    fn variant(&self, id: VariantId) -> Option<Variant> {
        (**self).variant(id)
    }

    fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> bool {
        (**self).soft_delete_product(id, at)
    }

    fn soft_delete_variant(&self, id: VariantId, at: DateTime<Utc>) -> bool {
        (**self).soft_delete_variant(id, at)
    }
}

/// Admin operation error.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("unknown relation type: {0}")]
    UnknownRelationType(RelationTypeId),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("unknown variant: {0}")]
    UnknownVariant(VariantId),

    #[error("relation type '{name}' applies to unsupported kind '{kind}'")]
    UnsupportedKind { name: String, kind: EntityKind },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Request to create a relation from the admin side.
///
/// `product_id` is the product whose admin page the request comes from; it
/// owns the edge when the relation type applies to products. When the type
/// applies to variants, `relatable_variant_id` names the owning variant
/// instead. The target always arrives as a variant.
#[derive(Debug, Clone)]
pub struct AddRelation {
    pub relation_type_id: RelationTypeId,
    pub product_id: ProductId,
    pub relatable_variant_id: Option<VariantId>,
    pub related_to_variant_id: VariantId,
    pub discount_amount: Option<Money>,
    pub position: Option<i32>,
}

/// Admin service over the relation engine and the catalog.
#[derive(Debug)]
pub struct CatalogRelations<S, R, C> {
    resolver: RelationResolver<S, R>,
    catalog: C,
}

impl<S, R, C> CatalogRelations<S, R, C>
where
    S: RelationStore,
    R: RelationTypeRegistry,
    C: CatalogStore,
{
    pub fn new(resolver: RelationResolver<S, R>, catalog: C) -> Self {
        Self { resolver, catalog }
    }

    pub fn resolver(&self) -> &RelationResolver<S, R> {
        &self.resolver
    }

    /// Create a relation, coercing the supplied variant target to match the
    /// relation type's owning kind.
    pub fn add_relation(&self, req: AddRelation) -> Result<Relation, AdminError> {
        let relation_type = self
            .resolver
            .registry()
            .get(req.relation_type_id)?
            .ok_or(AdminError::UnknownRelationType(req.relation_type_id))?;

        let (relatable, related_to) = if relation_type.applies_to == Product::KIND {
            let owner = self
                .catalog
                .product(req.product_id)
                .ok_or(AdminError::UnknownProduct(req.product_id))?;
            let target_variant = self
                .catalog
                .variant(req.related_to_variant_id)
                .ok_or(AdminError::UnknownVariant(req.related_to_variant_id))?;
            let target = self
                .catalog
                .product(target_variant.product_id())
                .ok_or(AdminError::UnknownProduct(target_variant.product_id()))?;
            (owner.entity_ref(), target.entity_ref())
        } else if relation_type.applies_to == Variant::KIND {
            let owner_id = req.relatable_variant_id.ok_or_else(|| {
                AdminError::Validation(
                    "a variant-scoped relation requires a relatable variant".to_string(),
                )
            })?;
            let owner = self
                .catalog
                .variant(owner_id)
                .ok_or(AdminError::UnknownVariant(owner_id))?;
            let target = self
                .catalog
                .variant(req.related_to_variant_id)
                .ok_or(AdminError::UnknownVariant(req.related_to_variant_id))?;
            (owner.entity_ref(), target.entity_ref())
        } else {
            return Err(AdminError::UnsupportedKind {
                name: relation_type.name,
                kind: relation_type.applies_to,
            });
        };

        let relation = self.resolver.store().create(NewRelation {
            relation_type_id: relation_type.id,
            relatable,
            related_to,
            discount_amount: req.discount_amount,
            position: req.position,
        })?;
        Ok(relation)
    }

    pub fn update_relation(
        &self,
        id: RelationId,
        update: RelationUpdate,
    ) -> Result<Relation, AdminError> {
        Ok(self.resolver.store().update(id, update)?)
    }

    pub fn remove_relation(&self, id: RelationId) -> Result<Relation, AdminError> {
        Ok(self.resolver.store().destroy(id)?)
    }

    /// Bulk position update for one owner's relations.
    pub fn update_positions(
        &self,
        owner: &EntityRef,
        positions: &[(RelationId, i32)],
    ) -> Result<(), AdminError> {
        Ok(self.resolver.store().reorder(owner, positions)?)
    }

    pub fn related(&self, owner: &EntityRef, name: &str) -> Result<Resolution, AdminError> {
        Ok(self.resolver.resolve(owner, name)?)
    }

    pub fn related_at(
        &self,
        owner: &EntityRef,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resolution, AdminError> {
        Ok(self.resolver.resolve_at(owner, name, now)?)
    }

    pub fn has_related(&self, kind: &EntityKind, name: &str) -> Result<bool, AdminError> {
        Ok(self.resolver.has_related(kind, name)?)
    }

    pub fn price_with_discount(
        &self,
        owner: &EntityRef,
        related_to: &EntityRef,
        name: &str,
    ) -> Result<Option<Money>, AdminError> {
        Ok(self.resolver.price_with_discount(owner, related_to, name)?)
    }

    /// Remove a product: cascade its relations (both directions), then
    /// soft-delete. The cascade completes before the product row goes away,
    /// so a concurrent reader never sees a dangling reference.
    pub fn remove_product(&self, id: ProductId) -> Result<(), AdminError> {
        let product = self
            .catalog
            .product(id)
            .ok_or(AdminError::UnknownProduct(id))?;
        self.resolver.on_destroy(&product.entity_ref())?;
        self.catalog.soft_delete_product(id, Utc::now());
        Ok(())
    }

    /// Remove a variant; same two-phase shape as [`Self::remove_product`].
    pub fn remove_variant(&self, id: VariantId) -> Result<(), AdminError> {
        let variant = self
            .catalog
            .variant(id)
            .ok_or(AdminError::UnknownVariant(id))?;
        self.resolver.on_destroy(&variant.entity_ref())?;
        self.catalog.soft_delete_variant(id, Utc::now());
        Ok(())
    }
}
