use std::{
    any::TypeId,
    sync::atomic::{AtomicU32, Ordering},
};

use dashmap::DashMap;

use crate::ecs::component::{Component, Id};

/// A thread-safe component registry, mapping component types to dense [`Id`]s.
///
/// Lookups go through a `DashMap` so the common path (an already registered type) never takes a
/// global lock. Registration only locks a single DashMap shard, and is idempotent: registering a
/// type twice yields the same id.
pub struct Registry {
    /// Map from TypeId to component Id.
    type_map: DashMap<TypeId, Id>,

    /// Next available component identifier.
    next_id: AtomicU32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new component registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Register a component type and get its identifier.
    ///
    /// If the component type is already registered, returns the existing ID.
    pub fn register<C: Component>(&self) -> Id {
        let type_id = TypeId::of::<C>();

        // Fast path
        if let Some(id) = self.type_map.get(&type_id) {
            return *id;
        }

        // The entry API keeps two racing registrations of the same type from both allocating.
        *self
            .type_map
            .entry(type_id)
            .or_insert_with(|| Id(self.next_id.fetch_add(1, Ordering::Relaxed)))
            .value()
    }

    /// Get the component ID for a provided type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map
            .get(&TypeId::of::<C>())
            .map(|entry| *entry.value())
    }

    /// The number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_map.len()
    }

    /// Whether no component types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_map.is_empty()
    }
}
