//! Type-keyed storage for singleton assets.
//!
//! [`Assets`] holds at most one value per [`Asset`] type. Inserting a value of a type already
//! present replaces it outright; there is no merge. Values are kept behind an `Arc` so a system's
//! cached argument can keep using the value it was given even after the asset is replaced, until
//! the invalidated slot is rematerialized.
//!
//! # Thread Safety
//!
//! `Assets` itself is not synchronized. The world keeps it behind the same lock as the entity
//! store so that reading an asset and linking to its key happen atomically with respect to
//! replacing it.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::ecs::asset::{self, Asset};

/// A type-erased, shared asset value.
pub type Shared = Arc<dyn Any + Send + Sync>;

/// Type-erased storage for singleton asset values.
#[derive(Default)]
pub struct Assets {
    data: HashMap<TypeId, Shared>,
}

impl Assets {
    /// Creates a new, empty asset storage.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Inserts an asset, replacing any previous value of the same type. Returns the asset's key.
    #[inline]
    pub fn insert<A: Asset>(&mut self, value: A) -> asset::Key {
        let key = asset::Key::of::<A>();
        self.data.insert(key.type_id(), Arc::new(value));
        key
    }

    /// Returns the current value of asset `A`, if one was inserted.
    #[inline]
    pub fn get<A: Asset>(&self) -> Option<Arc<A>> {
        self.data
            .get(&TypeId::of::<A>())
            .and_then(|stored| Arc::clone(stored).downcast::<A>().ok())
    }

    /// Returns the current value for an asset key without knowing its type.
    #[inline]
    pub fn get_by_key(&self, key: &asset::Key) -> Option<Shared> {
        self.data.get(&key.type_id()).cloned()
    }

    /// Returns `true` if a value exists for the asset key.
    #[inline]
    pub fn contains(&self, key: &asset::Key) -> bool {
        self.data.contains_key(&key.type_id())
    }

    /// Returns the number of assets currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no assets are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
