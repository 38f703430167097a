//! In-memory catalog: products, variants, and their entity sources.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use storefront_catalog::{CatalogStore, Product, ProductId, Variant, VariantId};
use storefront_core::EntityId;
use storefront_relations::{
    EntityKind, EntityRef, EntitySnapshot, EntitySource, OwnerTouch, RelatableEntity, StoreError,
};

/// In-memory product/variant storage.
///
/// Implements [`CatalogStore`] for the admin service, [`OwnerTouch`] so
/// relation mutations bump entity timestamps, and backs the per-kind
/// [`EntitySource`] adapters the resolution engine queries.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
    variants: RwLock<HashMap<VariantId, Variant>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_product(&self, product: Product) {
        if let Ok(mut products) = self.products.write() {
            products.insert(product.id_typed(), product);
        }
    }

    pub fn insert_variant(&self, variant: Variant) {
        if let Ok(mut variants) = self.variants.write() {
            variants.insert(variant.id_typed(), variant);
        }
    }
}

impl core::fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryCatalog")
            .field("products", &self.products.read().map(|p| p.len()).unwrap_or(0))
            .field("variants", &self.variants.read().map(|v| v.len()).unwrap_or(0))
            .finish()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.products.read().ok()?.get(&id).cloned()
    }

    fn variant(&self, id: VariantId) -> Option<Variant> {
        self.variants.read().ok()?.get(&id).cloned()
    }

    fn soft_delete_product(&self, id: ProductId, at: DateTime<Utc>) -> bool {
        let Ok(mut products) = self.products.write() else {
            return false;
        };
        match products.get_mut(&id) {
            Some(product) => {
                product.soft_delete(at);
                true
            }
            None => false,
        }
    }

    fn soft_delete_variant(&self, id: VariantId, at: DateTime<Utc>) -> bool {
        let Ok(mut variants) = self.variants.write() else {
            return false;
        };
        match variants.get_mut(&id) {
            Some(variant) => {
                variant.soft_delete(at);
                true
            }
            None => false,
        }
    }
}

impl OwnerTouch for InMemoryCatalog {
    fn touch(&self, entity: &EntityRef, at: DateTime<Utc>) {
        if entity.kind == Product::KIND {
            if let Ok(mut products) = self.products.write() {
                if let Some(product) = products.get_mut(&ProductId::new(entity.id)) {
                    product.touch(at);
                }
            }
        } else if entity.kind == Variant::KIND {
            if let Ok(mut variants) = self.variants.write() {
                if let Some(variant) = variants.get_mut(&VariantId::new(entity.id)) {
                    variant.touch(at);
                }
            }
        }
    }
}

/// [`EntitySource`] over the catalog's products.
pub struct ProductSource {
    catalog: Arc<InMemoryCatalog>,
}

impl ProductSource {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Self {
        Self { catalog }
    }
}

impl EntitySource for ProductSource {
    fn kind(&self) -> EntityKind {
        Product::KIND
    }

    fn load_visible(
        &self,
        ids: &[EntityId],
        now: DateTime<Utc>,
    ) -> Result<Vec<EntitySnapshot>, StoreError> {
        let products = self
            .catalog
            .products
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(&ProductId::new(*id)))
            .filter(|product| product.visible_for_relations(now))
            .map(|product| product.snapshot())
            .collect())
    }

    fn load(&self, id: EntityId) -> Result<Option<EntitySnapshot>, StoreError> {
        Ok(self.catalog.product(ProductId::new(id)).map(|p| p.snapshot()))
    }
}

/// [`EntitySource`] over the catalog's variants.
pub struct VariantSource {
    catalog: Arc<InMemoryCatalog>,
}

impl VariantSource {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Self {
        Self { catalog }
    }
}

impl EntitySource for VariantSource {
    fn kind(&self) -> EntityKind {
        Variant::KIND
    }

    fn load_visible(
        &self,
        ids: &[EntityId],
        now: DateTime<Utc>,
    ) -> Result<Vec<EntitySnapshot>, StoreError> {
        let variants = self
            .catalog
            .variants
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;
        Ok(ids
            .iter()
            .filter_map(|id| variants.get(&VariantId::new(*id)))
            .filter(|variant| variant.visible_for_relations(now))
            .map(|variant| variant.snapshot())
            .collect())
    }

    fn load(&self, id: EntityId) -> Result<Option<EntitySnapshot>, StoreError> {
        Ok(self.catalog.variant(VariantId::new(id)).map(|v| v.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storefront_core::Money;

    fn available_product(name: &str, now: DateTime<Utc>) -> Product {
        Product::new(
            ProductId::new(EntityId::new()),
            name,
            format!("SKU-{name}"),
            Money::from_cents(1_000),
            Some(now - Duration::days(1)),
            now,
        )
        .unwrap()
    }

    #[test]
    fn product_source_applies_the_product_filter() {
        let now = Utc::now();
        let catalog = InMemoryCatalog::arc();

        let visible = available_product("visible", now);
        let unreleased = Product::new(
            ProductId::new(EntityId::new()),
            "unreleased",
            "SKU-unreleased",
            Money::from_cents(1_000),
            Some(now + Duration::days(7)),
            now,
        )
        .unwrap();
        let mut deleted = available_product("deleted", now);
        deleted.soft_delete(now);

        let ids = vec![visible.entity_ref().id, unreleased.entity_ref().id, deleted.entity_ref().id];
        catalog.insert_product(visible);
        catalog.insert_product(unreleased);
        catalog.insert_product(deleted);

        let source = ProductSource::new(catalog);
        let snapshots = source.load_visible(&ids, now).unwrap();
        let names: Vec<&str> = snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["visible"]);

        // The unfiltered lookup still sees hidden products.
        assert!(source.load(ids[1]).unwrap().is_some());
    }

    #[test]
    fn touch_bumps_the_right_entity() {
        let now = Utc::now();
        let catalog = InMemoryCatalog::new();
        let product = available_product("bike", now);
        let product_id = product.id_typed();
        let reference = product.entity_ref();
        catalog.insert_product(product);

        let later = now + Duration::seconds(30);
        catalog.touch(&reference, later);
        assert_eq!(
            storefront_core::Entity::updated_at(&catalog.product(product_id).unwrap()),
            later
        );

        // Unknown refs and foreign kinds are ignored.
        catalog.touch(&EntityRef::new(Product::KIND, EntityId::new()), later);
        catalog.touch(&EntityRef::new(EntityKind::from_static("catalog.taxon"), EntityId::new()), later);
    }
}
