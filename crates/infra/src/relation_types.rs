//! In-memory relation type registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use storefront_core::RelationTypeId;
use storefront_relations::{EntityKind, RegistryError, RelationType, RelationTypeRegistry};

/// In-memory [`RelationTypeRegistry`].
///
/// Intended for tests/dev. The `unavailable` toggle simulates the backing
/// table not existing yet, the staged-rollout state the resolution engine
/// must tolerate.
pub struct InMemoryRelationTypeRegistry {
    types: RwLock<HashMap<RelationTypeId, RelationType>>,
    unavailable: AtomicBool,
}

impl InMemoryRelationTypeRegistry {
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace a relation type.
    pub fn insert(&self, relation_type: RelationType) {
        if let Ok(mut types) = self.types.write() {
            types.insert(relation_type.id, relation_type);
        }
    }

    pub fn remove(&self, id: RelationTypeId) -> Option<RelationType> {
        self.types.write().ok()?.remove(&id)
    }

    /// Make subsequent lookups report the backing storage as unavailable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), RegistryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable(
                "relation_types storage offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemoryRelationTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for InMemoryRelationTypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let len = self.types.read().map(|t| t.len()).unwrap_or(0);
        f.debug_struct("InMemoryRelationTypeRegistry")
            .field("types", &len)
            .field("unavailable", &self.unavailable.load(Ordering::SeqCst))
            .finish()
    }
}

impl RelationTypeRegistry for InMemoryRelationTypeRegistry {
    fn types_for(&self, kind: &EntityKind) -> Result<Vec<RelationType>, RegistryError> {
        self.check_available()?;
        let types = self
            .types
            .read()
            .map_err(|_| RegistryError::Internal("lock poisoned".to_string()))?;

        let mut matching: Vec<RelationType> = types
            .values()
            .filter(|rt| rt.applies_to == *kind)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(matching)
    }

    fn get(&self, id: RelationTypeId) -> Result<Option<RelationType>, RegistryError> {
        self.check_available()?;
        let types = self
            .types
            .read()
            .map_err(|_| RegistryError::Internal("lock poisoned".to_string()))?;
        Ok(types.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: EntityKind = EntityKind::from_static("catalog.product");
    const VARIANT: EntityKind = EntityKind::from_static("catalog.variant");

    fn registry() -> InMemoryRelationTypeRegistry {
        let registry = InMemoryRelationTypeRegistry::new();
        registry.insert(RelationType::new("Upsell", PRODUCT).unwrap());
        registry.insert(RelationType::new("Accessory", PRODUCT).unwrap());
        registry.insert(RelationType::new("Also Bought", VARIANT).unwrap());
        registry
    }

    #[test]
    fn types_for_is_scoped_and_name_ordered() {
        let registry = registry();
        let names: Vec<String> = registry
            .types_for(&PRODUCT)
            .unwrap()
            .into_iter()
            .map(|rt| rt.name)
            .collect();
        assert_eq!(names, vec!["Accessory", "Upsell"]);
    }

    #[test]
    fn find_by_name_uses_normalization() {
        let registry = registry();
        let found = registry.find_by_name(&VARIANT, "also_boughts").unwrap();
        assert_eq!(found.map(|rt| rt.name), Some("Also Bought".to_string()));
        assert!(registry.find_by_name(&PRODUCT, "also_boughts").unwrap().is_none());
    }

    #[test]
    fn unavailable_toggle_fails_lookups() {
        let registry = registry();
        registry.set_unavailable(true);
        assert!(matches!(
            registry.types_for(&PRODUCT),
            Err(RegistryError::Unavailable(_))
        ));
        assert!(matches!(
            registry.find_by_name(&PRODUCT, "Upsell"),
            Err(RegistryError::Unavailable(_))
        ));

        registry.set_unavailable(false);
        assert!(registry.find_by_name(&PRODUCT, "Upsell").unwrap().is_some());
    }

    #[test]
    fn remove_forgets_the_type() {
        let registry = registry();
        let upsell = registry.find_by_name(&PRODUCT, "Upsell").unwrap().unwrap();
        assert!(registry.remove(upsell.id).is_some());
        assert!(registry.get(upsell.id).unwrap().is_none());
        assert!(registry.find_by_name(&PRODUCT, "Upsell").unwrap().is_none());
    }
}
