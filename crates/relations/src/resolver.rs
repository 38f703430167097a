//! The relation resolution engine.
//!
//! Turns `(owner, relation-type name)` into the ordered, visibility-filtered
//! list of related entities. Name-based lookup is the primary API; dynamic
//! accessors are a thin adapter on top (see [`relation_accessors!`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use storefront_core::{EntityId, Money};

use crate::registry::{RegistryError, RelationTypeRegistry};
use crate::relation::{EntityKind, EntityRef, RelationType};
use crate::source::{EntitySnapshot, SourceRegistry};
use crate::store::{RelationStore, StoreError};

/// Resolution engine error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A relation targets an entity kind with no registered source.
    #[error("no entity source registered for kind '{0}'")]
    UnknownKind(EntityKind),
}

/// Outcome of a resolution.
///
/// "The requested relation concept does not exist for this entity kind" is a
/// distinct outcome from "it exists but currently has no presentable
/// targets"; callers use the former to decide whether to expose the feature
/// at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NoSuchRelation,
    Related(Vec<EntitySnapshot>),
}

impl Resolution {
    pub fn is_no_such_relation(&self) -> bool {
        matches!(self, Resolution::NoSuchRelation)
    }

    /// The resolved entities, or `None` for `NoSuchRelation`.
    pub fn entities(&self) -> Option<&[EntitySnapshot]> {
        match self {
            Resolution::NoSuchRelation => None,
            Resolution::Related(items) => Some(items),
        }
    }
}

/// Name-based resolution over a relation store, a type registry, and the
/// per-kind entity sources.
#[derive(Debug)]
pub struct RelationResolver<S, R> {
    store: S,
    registry: R,
    sources: SourceRegistry,
}

impl<S, R> RelationResolver<S, R>
where
    S: RelationStore,
    R: RelationTypeRegistry,
{
    pub fn new(store: S, registry: R, sources: SourceRegistry) -> Self {
        Self {
            store,
            registry,
            sources,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve the owner's related entities for a relation-type name.
    ///
    /// Ordering: the result preserves the position order of the owner's
    /// relation rows, with filtered-out targets removed; filtering never
    /// reorders survivors.
    pub fn resolve(&self, owner: &EntityRef, name: &str) -> Result<Resolution, ResolveError> {
        self.resolve_at(owner, name, Utc::now())
    }

    /// [`resolve`](Self::resolve) with an explicit "now" for the visibility
    /// filters.
    pub fn resolve_at(
        &self,
        owner: &EntityRef,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Resolution, ResolveError> {
        let Some(relation_type) = self.relation_type_for(&owner.kind, name)? else {
            return Ok(Resolution::NoSuchRelation);
        };

        // Candidate targets, position-ordered.
        let relations = self.store.list_for_owner(owner, Some(relation_type.id))?;
        let candidates: Vec<EntityRef> = relations.into_iter().map(|r| r.related_to).collect();

        // Load visible snapshots per target kind. Targets are usually all of
        // one kind, but nothing requires that.
        let mut by_kind: HashMap<EntityKind, Vec<EntityId>> = HashMap::new();
        for target in &candidates {
            by_kind.entry(target.kind.clone()).or_default().push(target.id);
        }

        let mut visible: HashMap<EntityRef, EntitySnapshot> = HashMap::new();
        for (kind, ids) in by_kind {
            let source = self
                .sources
                .get(&kind)
                .ok_or_else(|| ResolveError::UnknownKind(kind.clone()))?;
            for snapshot in source.load_visible(&ids, now)? {
                visible.insert(snapshot.entity.clone(), snapshot);
            }
        }

        // Re-impose candidate order on the survivors.
        let items = candidates
            .into_iter()
            .filter_map(|target| visible.remove(&target))
            .collect();

        Ok(Resolution::Related(items))
    }

    /// Whether a matching relation type exists for the kind, independent of
    /// whether any relations or targets currently exist.
    pub fn has_related(&self, kind: &EntityKind, name: &str) -> Result<bool, ResolveError> {
        Ok(self.relation_type_for(kind, name)?.is_some())
    }

    /// The target's base price minus the discount recorded on the specific
    /// edge connecting `owner` to `related_to` under `name`.
    ///
    /// A missing edge, relation type, or discount means no discount and the
    /// base price comes back unmodified. `None` only when the target entity
    /// itself is unknown.
    pub fn price_with_discount(
        &self,
        owner: &EntityRef,
        related_to: &EntityRef,
        name: &str,
    ) -> Result<Option<Money>, ResolveError> {
        let source = self
            .sources
            .get(&related_to.kind)
            .ok_or_else(|| ResolveError::UnknownKind(related_to.kind.clone()))?;
        let Some(target) = source.load(related_to.id)? else {
            return Ok(None);
        };

        let discount = match self.relation_type_for(&owner.kind, name)? {
            Some(relation_type) => self
                .store
                .list_for_owner(owner, Some(relation_type.id))?
                .into_iter()
                .find(|r| r.related_to == *related_to)
                .and_then(|r| r.discount_amount)
                .unwrap_or(Money::ZERO),
            None => Money::ZERO,
        };

        Ok(Some(target.price.saturating_sub(discount)))
    }

    /// Cascading cleanup hook for the owning entity's destruction lifecycle.
    ///
    /// Two explicit phases: first relations *from* this entity, then
    /// relations *to* it. Both complete before the caller finalizes the
    /// entity's own removal.
    pub fn on_destroy(&self, entity: &EntityRef) -> Result<(), ResolveError> {
        self.store.destroy_where_owner(entity)?;
        self.store.destroy_where_target(entity)?;
        Ok(())
    }

    /// Registry lookup with the staged-rollout accommodation: a registry
    /// whose backing storage is unavailable (mid-migration in a multi-module
    /// deployment) reads as "no such relation" instead of an error. This is
    /// a deliberate fallback branch, not an exception swallow; anything
    /// else the registry reports propagates.
    fn relation_type_for(
        &self,
        kind: &EntityKind,
        name: &str,
    ) -> Result<Option<RelationType>, ResolveError> {
        match self.registry.find_by_name(kind, name) {
            Ok(found) => Ok(found),
            Err(RegistryError::Unavailable(reason)) => {
                tracing::warn!(%reason, %kind, name, "relation type storage unavailable, treating as no such relation");
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Generate named accessors that delegate to [`RelationResolver::resolve`].
///
/// The name-as-method convenience lives outside the engine: the macro
/// produces an extension trait whose methods resolve a fixed relation-type
/// name.
///
/// ```
/// use storefront_relations::relation_accessors;
///
/// relation_accessors!(ShelfAccessors {
///     upsells => "Upsell",
///     also_boughts => "Also Bought",
/// });
/// ```
#[macro_export]
macro_rules! relation_accessors {
    ($vis:vis $trait_name:ident { $($method:ident => $name:literal),+ $(,)? }) => {
        $vis trait $trait_name {
            $(
                fn $method(
                    &self,
                    owner: &$crate::EntityRef,
                ) -> Result<$crate::Resolution, $crate::ResolveError>;
            )+
        }

        impl<S, R> $trait_name for $crate::RelationResolver<S, R>
        where
            S: $crate::RelationStore,
            R: $crate::RelationTypeRegistry,
        {
            $(
                fn $method(
                    &self,
                    owner: &$crate::EntityRef,
                ) -> Result<$crate::Resolution, $crate::ResolveError> {
                    self.resolve(owner, $name)
                }
            )+
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    use storefront_core::{RelationId, RelationTypeId};

    use crate::relation::{NewRelation, Relation, RelationUpdate};
    use crate::source::EntitySource;

    const PRODUCT: EntityKind = EntityKind::from_static("catalog.product");

    /// Fixed list of relations; only `list_for_owner` matters here.
    struct FixedStore(Vec<Relation>);

    impl RelationStore for FixedStore {
        fn get(&self, id: RelationId) -> Result<Option<Relation>, StoreError> {
            Ok(self.0.iter().find(|r| r.id == id).cloned())
        }

        fn create(&self, _new: NewRelation) -> Result<Relation, StoreError> {
            unimplemented!("not needed for resolution tests")
        }

        fn update(&self, id: RelationId, _update: RelationUpdate) -> Result<Relation, StoreError> {
            Err(StoreError::NotFound(id))
        }

        fn destroy(&self, id: RelationId) -> Result<Relation, StoreError> {
            Err(StoreError::NotFound(id))
        }

        fn reorder(
            &self,
            _owner: &EntityRef,
            _positions: &[(RelationId, i32)],
        ) -> Result<(), StoreError> {
            Ok(())
        }

        fn list_for_owner(
            &self,
            owner: &EntityRef,
            relation_type: Option<RelationTypeId>,
        ) -> Result<Vec<Relation>, StoreError> {
            let mut rows: Vec<Relation> = self
                .0
                .iter()
                .filter(|r| r.relatable == *owner)
                .filter(|r| relation_type.map_or(true, |rt| r.relation_type_id == rt))
                .cloned()
                .collect();
            rows.sort_by_key(|r| (r.position, r.id));
            Ok(rows)
        }

        fn destroy_where_owner(&self, _entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
            Ok(vec![])
        }

        fn destroy_where_target(&self, _entity: &EntityRef) -> Result<Vec<Relation>, StoreError> {
            Ok(vec![])
        }
    }

    /// Registry stub that can simulate unavailable backing storage.
    struct StubRegistry {
        types: Vec<RelationType>,
        unavailable: bool,
    }

    impl RelationTypeRegistry for StubRegistry {
        fn types_for(&self, kind: &EntityKind) -> Result<Vec<RelationType>, RegistryError> {
            if self.unavailable {
                return Err(RegistryError::Unavailable("relation_types missing".into()));
            }
            Ok(self
                .types
                .iter()
                .filter(|rt| rt.applies_to == *kind)
                .cloned()
                .collect())
        }

        fn get(&self, id: RelationTypeId) -> Result<Option<RelationType>, RegistryError> {
            if self.unavailable {
                return Err(RegistryError::Unavailable("relation_types missing".into()));
            }
            Ok(self.types.iter().find(|rt| rt.id == id).cloned())
        }
    }

    /// Source over a fixed set of snapshots; ids in `hidden` fail the
    /// visibility filter.
    struct StubSource {
        kind: EntityKind,
        snapshots: Vec<EntitySnapshot>,
        hidden: Vec<EntityId>,
    }

    impl EntitySource for StubSource {
        fn kind(&self) -> EntityKind {
            self.kind.clone()
        }

        fn load_visible(
            &self,
            ids: &[EntityId],
            _now: DateTime<Utc>,
        ) -> Result<Vec<EntitySnapshot>, StoreError> {
            Ok(self
                .snapshots
                .iter()
                .filter(|s| ids.contains(&s.entity.id) && !self.hidden.contains(&s.entity.id))
                .cloned()
                .collect())
        }

        fn load(&self, id: EntityId) -> Result<Option<EntitySnapshot>, StoreError> {
            Ok(self.snapshots.iter().find(|s| s.entity.id == id).cloned())
        }
    }

    struct Fixture {
        owner: EntityRef,
        relation_type: RelationType,
        targets: Vec<EntityRef>,
    }

    fn snapshot(target: &EntityRef, name: &str, cents: u64) -> EntitySnapshot {
        EntitySnapshot {
            entity: target.clone(),
            name: name.to_string(),
            price: Money::from_cents(cents),
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            owner: EntityRef::new(PRODUCT, EntityId::new()),
            relation_type: RelationType::new("Upsell", PRODUCT).unwrap(),
            targets: (0..3)
                .map(|_| EntityRef::new(PRODUCT, EntityId::new()))
                .collect(),
        }
    }

    fn resolver_with(
        fx: &Fixture,
        hidden: Vec<EntityId>,
        discounts: Vec<Option<Money>>,
    ) -> RelationResolver<FixedStore, StubRegistry> {
        let relations = fx
            .targets
            .iter()
            .enumerate()
            .map(|(i, target)| Relation {
                id: RelationId::new(),
                relation_type_id: fx.relation_type.id,
                relatable: fx.owner.clone(),
                related_to: target.clone(),
                discount_amount: discounts.get(i).copied().flatten(),
                position: i as i32,
            })
            .collect();

        let snapshots = fx
            .targets
            .iter()
            .enumerate()
            .map(|(i, t)| snapshot(t, &format!("target-{i}"), 1_000 + i as u64))
            .collect();

        let mut sources = SourceRegistry::new();
        sources.register(std::sync::Arc::new(StubSource {
            kind: PRODUCT,
            snapshots,
            hidden,
        }));

        RelationResolver::new(
            FixedStore(relations),
            StubRegistry {
                types: vec![fx.relation_type.clone()],
                unavailable: false,
            },
            sources,
        )
    }

    #[test]
    fn resolve_preserves_position_order() {
        let fx = fixture();
        let resolver = resolver_with(&fx, vec![], vec![]);

        let resolution = resolver.resolve(&fx.owner, "upsell").unwrap();
        let entities = resolution.entities().unwrap();
        let resolved: Vec<&EntityRef> = entities.iter().map(|s| &s.entity).collect();
        assert_eq!(resolved, fx.targets.iter().collect::<Vec<_>>());
    }

    #[test]
    fn filtered_targets_are_removed_without_reordering_survivors() {
        let fx = fixture();
        let resolver = resolver_with(&fx, vec![fx.targets[1].id], vec![]);

        let resolution = resolver.resolve(&fx.owner, "Upsell").unwrap();
        let entities = resolution.entities().unwrap();
        let resolved: Vec<&EntityRef> = entities.iter().map(|s| &s.entity).collect();
        assert_eq!(resolved, vec![&fx.targets[0], &fx.targets[2]]);
    }

    #[test]
    fn unknown_name_is_no_such_relation_not_empty() {
        let fx = fixture();
        let resolver = resolver_with(&fx, vec![], vec![]);

        let resolution = resolver.resolve(&fx.owner, "frequently repaired").unwrap();
        assert!(resolution.is_no_such_relation());
        assert!(resolution.entities().is_none());

        // Known name with all targets filtered is Related([]), not NoSuchRelation.
        let all_hidden = fx.targets.iter().map(|t| t.id).collect();
        let resolver = resolver_with(&fx, all_hidden, vec![]);
        let resolution = resolver.resolve(&fx.owner, "upsell").unwrap();
        assert_eq!(resolution, Resolution::Related(vec![]));
    }

    #[test]
    fn registry_unavailable_downgrades_to_no_such_relation() {
        let fx = fixture();
        let mut resolver = resolver_with(&fx, vec![], vec![]);
        resolver.registry.unavailable = true;

        let resolution = resolver.resolve(&fx.owner, "upsell").unwrap();
        assert!(resolution.is_no_such_relation());
        assert!(!resolver.has_related(&PRODUCT, "upsell").unwrap());
    }

    #[test]
    fn has_related_reports_the_concept_not_the_rows() {
        let fx = fixture();
        let resolver = resolver_with(&fx, vec![], vec![]);

        assert!(resolver.has_related(&PRODUCT, "Upsells").unwrap());
        assert!(!resolver.has_related(&PRODUCT, "Cross Sell").unwrap());
        // Other kinds don't inherit the type.
        let variant = EntityKind::from_static("catalog.variant");
        assert!(!resolver.has_related(&variant, "Upsell").unwrap());
    }

    #[test]
    fn price_with_discount_subtracts_the_edge_discount() {
        let fx = fixture();
        let resolver = resolver_with(
            &fx,
            vec![],
            vec![Some(Money::from_cents(150)), None, Some(Money::from_cents(9_999))],
        );

        // target-0 has a 150c discount on a 1000c base price.
        let price = resolver
            .price_with_discount(&fx.owner, &fx.targets[0], "upsell")
            .unwrap();
        assert_eq!(price, Some(Money::from_cents(850)));

        // target-1 has no discount recorded: base price unmodified.
        let price = resolver
            .price_with_discount(&fx.owner, &fx.targets[1], "upsell")
            .unwrap();
        assert_eq!(price, Some(Money::from_cents(1_001)));

        // Oversized discounts clamp to zero.
        let price = resolver
            .price_with_discount(&fx.owner, &fx.targets[2], "upsell")
            .unwrap();
        assert_eq!(price, Some(Money::ZERO));

        // No edge at all behaves like no discount.
        let stranger = EntityRef::new(PRODUCT, EntityId::new());
        assert_eq!(
            resolver.price_with_discount(&fx.owner, &stranger, "upsell").unwrap(),
            None
        );
    }

    #[test]
    fn accessor_macro_delegates_to_resolve() {
        relation_accessors!(TestAccessors {
            upsells => "Upsell",
        });

        let fx = fixture();
        let resolver = resolver_with(&fx, vec![], vec![]);
        let resolution = resolver.upsells(&fx.owner).unwrap();
        assert_eq!(resolution.entities().unwrap().len(), 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Survivors keep candidate order under arbitrary hidden subsets.
            #[test]
            fn survivors_keep_candidate_order(mask in proptest::collection::vec(any::<bool>(), 3)) {
                let fx = fixture();
                let hidden: Vec<EntityId> = fx
                    .targets
                    .iter()
                    .zip(&mask)
                    .filter(|(_, hide)| **hide)
                    .map(|(t, _)| t.id)
                    .collect();
                let resolver = resolver_with(&fx, hidden, vec![]);

                let resolution = resolver.resolve(&fx.owner, "upsell").unwrap();
                let resolved: Vec<EntityRef> = resolution
                    .entities()
                    .unwrap()
                    .iter()
                    .map(|s| s.entity.clone())
                    .collect();
                let expected: Vec<EntityRef> = fx
                    .targets
                    .iter()
                    .zip(&mask)
                    .filter(|(_, hide)| !**hide)
                    .map(|(t, _)| t.clone())
                    .collect();
                prop_assert_eq!(resolved, expected);
            }
        }
    }
}
