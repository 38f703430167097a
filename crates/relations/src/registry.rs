//! Relation type registry: lookup of relation types by owning entity kind.

use std::sync::Arc;

use thiserror::Error;

use storefront_core::RelationTypeId;

use crate::naming;
use crate::relation::{EntityKind, RelationType};

/// Registry operation error.
///
/// `Unavailable` models the backing storage for relation types not existing
/// yet; this happens mid-migration when modules are rolled out in stages.
/// The resolution engine downgrades it to "no such relation"; every other
/// error propagates.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("relation type storage unavailable: {0}")]
    Unavailable(String),

    #[error("registry error: {0}")]
    Internal(String),
}

/// Catalog of relation kinds, each scoped to exactly one entity kind.
pub trait RelationTypeRegistry: Send + Sync {
    /// All relation types whose `applies_to` equals the given kind,
    /// ordered by name.
    fn types_for(&self, kind: &EntityKind) -> Result<Vec<RelationType>, RegistryError>;

    /// Look up a relation type by id.
    fn get(&self, id: RelationTypeId) -> Result<Option<RelationType>, RegistryError>;

    /// Find a relation type by name within the given kind's types.
    ///
    /// Both the stored name and the requested key are normalized (case,
    /// spacing, pluralization) before comparison. Absence is an expected
    /// outcome, not an error.
    fn find_by_name(
        &self,
        kind: &EntityKind,
        name: &str,
    ) -> Result<Option<RelationType>, RegistryError> {
        let wanted = naming::normalize(name);
        let types = self.types_for(kind)?;
        Ok(types
            .into_iter()
            .find(|rt| naming::normalize(&rt.name) == wanted))
    }
}

impl<R> RelationTypeRegistry for Arc<R>
where
    R: RelationTypeRegistry + ?Sized,
{
    fn types_for(&self, kind: &EntityKind) -> Result<Vec<RelationType>, RegistryError> {
        (**self).types_for(kind)
    }

    fn get(&self, id: RelationTypeId) -> Result<Option<RelationType>, RegistryError> {
        (**self).get(id)
    }

    fn find_by_name(
        &self,
        kind: &EntityKind,
        name: &str,
    ) -> Result<Option<RelationType>, RegistryError> {
        (**self).find_by_name(kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT: EntityKind = EntityKind::from_static("catalog.product");
    const VARIANT: EntityKind = EntityKind::from_static("catalog.variant");

    struct FixedRegistry(Vec<RelationType>);

    impl RelationTypeRegistry for FixedRegistry {
        fn types_for(&self, kind: &EntityKind) -> Result<Vec<RelationType>, RegistryError> {
            Ok(self
                .0
                .iter()
                .filter(|rt| rt.applies_to == *kind)
                .cloned()
                .collect())
        }

        fn get(&self, id: RelationTypeId) -> Result<Option<RelationType>, RegistryError> {
            Ok(self.0.iter().find(|rt| rt.id == id).cloned())
        }
    }

    fn registry() -> FixedRegistry {
        FixedRegistry(vec![
            RelationType::new("Also Bought", PRODUCT).unwrap(),
            RelationType::new("Upsell", PRODUCT).unwrap(),
            RelationType::new("Accessory", VARIANT).unwrap(),
        ])
    }

    #[test]
    fn find_by_name_normalizes_both_sides() {
        let registry = registry();
        for key in ["Also Bought", "also_bought", "Also Boughts", "ALSO BOUGHT"] {
            let found = registry.find_by_name(&PRODUCT, key).unwrap();
            assert_eq!(found.map(|rt| rt.name), Some("Also Bought".to_string()), "key {key:?}");
        }
    }

    #[test]
    fn find_by_name_is_scoped_to_the_kind() {
        let registry = registry();
        assert!(registry.find_by_name(&VARIANT, "Upsell").unwrap().is_none());
        assert!(registry.find_by_name(&VARIANT, "Accessory").unwrap().is_some());
    }

    #[test]
    fn absence_is_ok_none() {
        let registry = registry();
        assert!(registry.find_by_name(&PRODUCT, "no such thing").unwrap().is_none());
    }
}
