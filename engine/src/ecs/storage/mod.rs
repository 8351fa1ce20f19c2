//! Entity record storage for the ECS.
//!
//! The [`ObjectStore`] holds one record per live entity: a map from component [`Id`] to a shared
//! component value. Each record occupies a dense slot, and alongside the records the store keeps a
//! [`TypeIndex`], one bitset of slots per component type, so that "every entity carrying
//! components {T1..Tn}" is a bitset intersection rather than a scan.
//!
//! ```text
//! slots                            index
//! ┌───┬───────────┬──────────────┐ ┌──────────┬─────────────────┐
//! │ 0 │ Entity(1) │ {E, Pos, Vel}│ │ E        │ 1 1 1           │
//! │ 1 │ Entity(2) │ {E, Pos}     │ │ Pos      │ 1 1 0           │
//! │ 2 │ Entity(3) │ {E, Vel}     │ │ Vel      │ 1 0 1           │
//! └───┴───────────┴──────────────┘ └──────────┴─────────────────┘
//!                                  list(Pos, Vel) = 1 0 0 → [Entity(1)]
//! ```
//!
//! Entity ids are never reused, but slots are: deleting a record frees its slot for the next
//! create. The index therefore spans the most records ever live at once, not every id ever handed
//! out, and listing costs the same after any amount of churn.
//!
//! Every record carries the [`Entity`] itself as a component (`E` above), so entities can be
//! queried for their own identity and the `E` bitset doubles as the set of live slots.
//!
//! The records and the index always agree on membership: every mutation updates both.
//!
//! # Thread Safety
//!
//! Entity ids are allocated atomically, but the store itself is not synchronized. The world
//! serializes access to it behind a lock.

use std::{collections::HashMap, sync::Arc};

use crate::ecs::{
    component::{Id, Registry, Values},
    entity::{Allocator, Entity},
};

mod assets;
mod index;

pub use assets::{Assets, Shared};
pub use index::TypeIndex;

/// One entity's record, as returned by [`ObjectStore::list`].
#[derive(Debug, Clone)]
pub struct Row {
    /// The entity the record belongs to.
    pub entity: Entity,

    /// A copy of the entity's components.
    pub values: Values,
}

/// A live entity's components and the slot they occupy.
struct Record {
    slot: usize,
    values: Values,
}

/// Storage for entity records, indexed by component type.
pub struct ObjectStore {
    /// Entity id source. Ids are never reused.
    allocator: Allocator,

    /// Live entity records.
    records: HashMap<Entity, Record>,

    /// The entity occupying each slot, `None` for a free slot.
    slots: Vec<Option<Entity>>,

    /// Free slots, reused before the slot vector grows.
    free: Vec<usize>,

    /// Component type membership for every occupied slot.
    index: TypeIndex,

    /// The component id of [`Entity`] itself.
    entity_component: Id,
}

impl ObjectStore {
    /// Create an empty store, registering the [`Entity`] component with `registry`.
    pub fn new(registry: &Registry) -> Self {
        Self {
            allocator: Allocator::new(),
            records: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            index: TypeIndex::new(),
            entity_component: registry.register::<Entity>(),
        }
    }

    /// The component id under which every record stores its own [`Entity`].
    #[inline]
    pub fn entity_component(&self) -> Id {
        self.entity_component
    }

    /// Store `values` under a freshly allocated entity and return it.
    ///
    /// Any value supplied for the entity component is replaced by the new entity.
    pub fn create(&mut self, mut values: Values) -> Entity {
        let entity = self.allocator.alloc();
        values.insert(self.entity_component, Arc::new(entity));
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entity);
                slot
            }
            None => {
                self.slots.push(Some(entity));
                self.slots.len() - 1
            }
        };
        for id in values.ids() {
            self.index.insert(id, slot);
        }
        self.records.insert(entity, Record { slot, values });
        entity
    }

    /// Merge `add` into the entity's record and drop the `remove` types.
    ///
    /// Returns `None`, and changes nothing, if the entity does not exist. Otherwise returns the
    /// component types that the record did not carry before. The entity component is neither
    /// overwritten nor removed.
    pub fn update(&mut self, entity: Entity, add: Values, remove: &[Id]) -> Option<Vec<Id>> {
        let record = self.records.get_mut(&entity)?;

        let mut added = Vec::new();
        for (id, value) in add.iter() {
            if id == self.entity_component {
                continue;
            }
            if record.values.insert(id, Arc::clone(value)).is_none() {
                self.index.insert(id, record.slot);
                added.push(id);
            }
        }

        for &id in remove {
            if id == self.entity_component {
                continue;
            }
            if record.values.remove(id).is_some() {
                self.index.remove(id, record.slot);
            }
        }

        Some(added)
    }

    /// Remove the entity's record, returning it. `None` if the entity does not exist.
    pub fn delete(&mut self, entity: Entity) -> Option<Values> {
        let Record { slot, values } = self.records.remove(&entity)?;
        for id in values.ids() {
            self.index.remove(id, slot);
        }
        self.slots[slot] = None;
        self.free.push(slot);
        Some(values)
    }

    /// The entity's record, if it exists.
    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&Values> {
        self.records.get(&entity).map(|record| &record.values)
    }

    /// Whether the entity exists.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.records.contains_key(&entity)
    }

    /// Copies of every record carrying all of `types`, in ascending entity order.
    ///
    /// An empty `types` slice places no constraint and lists every live entity.
    pub fn list(&self, types: &[Id]) -> Vec<Row> {
        let matched = if types.is_empty() {
            self.index.matching(&[self.entity_component])
        } else {
            self.index.matching(types)
        };

        let mut rows: Vec<Row> = matched
            .ones()
            .filter_map(|slot| {
                let entity = self.slots.get(slot).copied().flatten()?;
                self.records.get(&entity).map(|record| Row {
                    entity,
                    values: record.values.clone(),
                })
            })
            .collect();
        rows.sort_unstable_by_key(|row| row.entity);
        rows
    }

    /// The number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no entities are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The number of record slots, occupied or free. This is the most entities ever live at once.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The number of entity ids handed out, including those since deleted.
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.allocator.allocated()
    }
}

#[cfg(test)]
mod tests {
    use tickworks_macros::Component;

    use super::*;

    #[derive(Component, Clone, Debug, PartialEq)]
    struct A(u32);

    #[derive(Component, Clone, Debug, PartialEq)]
    struct B(u32);

    #[derive(Component, Clone, Debug, PartialEq)]
    struct C;

    struct Fixture {
        registry: Registry,
        store: ObjectStore,
        a: Id,
        b: Id,
        c: Id,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Registry::new();
            let store = ObjectStore::new(&registry);
            let (a, b, c) = (
                registry.register::<A>(),
                registry.register::<B>(),
                registry.register::<C>(),
            );
            Self {
                registry,
                store,
                a,
                b,
                c,
            }
        }

        fn values(&self, a: Option<u32>, b: Option<u32>) -> Values {
            let mut values = Values::new();
            if let Some(a) = a {
                values.insert(self.a, Arc::new(A(a)));
            }
            if let Some(b) = b {
                values.insert(self.b, Arc::new(B(b)));
            }
            values
        }
    }

    fn entities(rows: &[Row]) -> Vec<Entity> {
        rows.iter().map(|row| row.entity).collect()
    }

    #[test]
    fn create_allocates_increasing_ids() {
        // Given
        let mut fx = Fixture::new();

        // When
        let e1 = fx.store.create(fx.values(Some(1), None));
        let e2 = fx.store.create(fx.values(Some(2), None));
        fx.store.delete(e2);
        let e3 = fx.store.create(fx.values(Some(3), None));

        // Then
        assert_eq!(e1, Entity::from_raw(1));
        assert!(e1 < e2 && e2 < e3);
        assert_eq!(fx.store.len(), 2);
        assert_eq!(fx.store.allocated(), 3);
    }

    #[test]
    fn create_stores_entity_as_component() {
        // Given
        let mut fx = Fixture::new();

        // When
        let entity = fx.store.create(fx.values(Some(1), None));

        // Then
        let record = fx.store.get(entity).unwrap();
        assert_eq!(
            record.get_as::<Entity>(fx.store.entity_component()),
            Some(&entity)
        );
        assert_eq!(
            entities(&fx.store.list(&[fx.store.entity_component()])),
            vec![entity]
        );
        assert_eq!(fx.registry.get::<Entity>(), Some(fx.store.entity_component()));
    }

    #[test]
    fn list_intersects_component_types() {
        // Given - E1 = {A, B}, E2 = {A}, E3 = {B}
        let mut fx = Fixture::new();
        let e1 = fx.store.create(fx.values(Some(1), Some(1)));
        let e2 = fx.store.create(fx.values(Some(2), None));
        let e3 = fx.store.create(fx.values(None, Some(3)));

        // Then
        assert_eq!(entities(&fx.store.list(&[fx.a, fx.b])), vec![e1]);
        assert_eq!(entities(&fx.store.list(&[fx.a])), vec![e1, e2]);
        assert_eq!(entities(&fx.store.list(&[fx.b])), vec![e1, e3]);
        assert!(fx.store.list(&[fx.a, fx.b, fx.c]).is_empty());
    }

    #[test]
    fn list_without_types_returns_every_entity() {
        // Given
        let mut fx = Fixture::new();
        let e1 = fx.store.create(fx.values(Some(1), None));
        let e2 = fx.store.create(Values::new());

        // Then
        assert_eq!(entities(&fx.store.list(&[])), vec![e1, e2]);
    }

    #[test]
    fn list_returns_copies() {
        // Given
        let mut fx = Fixture::new();
        let entity = fx.store.create(fx.values(Some(1), None));
        let rows = fx.store.list(&[fx.a]);

        // When
        let update = fx.values(Some(9), None);
        fx.store.update(entity, update, &[]);

        // Then - Rows listed earlier keep the old value
        assert_eq!(rows[0].values.get_as::<A>(fx.a), Some(&A(1)));
        assert_eq!(
            fx.store.get(entity).unwrap().get_as::<A>(fx.a),
            Some(&A(9))
        );
    }

    #[test]
    fn update_merges_and_removes() {
        // Given
        let mut fx = Fixture::new();
        let entity = fx.store.create(fx.values(Some(1), None));

        // When
        let added = fx
            .store
            .update(entity, fx.values(Some(2), Some(3)), &[])
            .unwrap();

        // Then
        assert_eq!(added, vec![fx.b]);
        assert_eq!(entities(&fx.store.list(&[fx.a, fx.b])), vec![entity]);

        // When
        let added = fx.store.update(entity, Values::new(), &[fx.a, fx.c]).unwrap();

        // Then
        assert!(added.is_empty());
        assert!(fx.store.list(&[fx.a]).is_empty());
        assert_eq!(entities(&fx.store.list(&[fx.b])), vec![entity]);
    }

    #[test]
    fn update_protects_entity_component() {
        // Given
        let mut fx = Fixture::new();
        let entity = fx.store.create(Values::new());
        let id = fx.store.entity_component();
        let mut forged = Values::new();
        forged.insert(id, Arc::new(Entity::from_raw(99)));

        // When
        fx.store.update(entity, forged, &[id]);

        // Then
        let record = fx.store.get(entity).unwrap();
        assert_eq!(record.get_as::<Entity>(id), Some(&entity));
        assert_eq!(entities(&fx.store.list(&[])), vec![entity]);
    }

    #[test]
    fn update_unknown_entity_is_noop() {
        // Given
        let mut fx = Fixture::new();

        // When
        let result = fx
            .store
            .update(Entity::from_raw(42), fx.values(Some(1), None), &[]);

        // Then
        assert!(result.is_none());
        assert!(fx.store.is_empty());
        assert!(fx.store.list(&[fx.a]).is_empty());
    }

    #[test]
    fn delete_clears_index() {
        // Given
        let mut fx = Fixture::new();
        let entity = fx.store.create(fx.values(Some(1), Some(2)));

        // When
        let removed = fx.store.delete(entity).unwrap();

        // Then
        assert_eq!(removed.get_as::<A>(fx.a), Some(&A(1)));
        assert!(!fx.store.contains(entity));
        assert!(fx.store.list(&[fx.a]).is_empty());
        assert!(fx.store.list(&[]).is_empty());
        assert!(fx.store.delete(entity).is_none());
    }

    #[test]
    fn deleted_slots_are_reused_without_reusing_ids() {
        // Given
        let mut fx = Fixture::new();
        let survivor = fx.store.create(fx.values(Some(0), None));

        // When - Churn far more entities than are ever live at once
        let mut last = survivor;
        for round in 0..10_000 {
            let entity = fx.store.create(fx.values(Some(round), Some(round)));
            assert!(entity > last);
            last = entity;
            fx.store.delete(entity);
        }

        // Then
        assert_eq!(fx.store.len(), 1);
        assert_eq!(fx.store.slot_count(), 2);
        assert_eq!(fx.store.allocated(), 10_001);
        assert_eq!(entities(&fx.store.list(&[])), vec![survivor]);
        assert_eq!(entities(&fx.store.list(&[fx.a])), vec![survivor]);
        assert!(fx.store.list(&[fx.b]).is_empty());
    }

    #[test]
    fn list_orders_by_entity_when_slots_are_reused() {
        // Given - e3 takes the slot e1 freed, ahead of e2's slot
        let mut fx = Fixture::new();
        let e1 = fx.store.create(fx.values(Some(1), None));
        let e2 = fx.store.create(fx.values(Some(2), None));
        fx.store.delete(e1);
        let e3 = fx.store.create(fx.values(Some(3), None));

        // Then
        assert_eq!(fx.store.slot_count(), 2);
        assert_eq!(entities(&fx.store.list(&[fx.a])), vec![e2, e3]);
        assert_eq!(fx.store.get(e3).unwrap().get_as::<A>(fx.a), Some(&A(3)));
    }
}
