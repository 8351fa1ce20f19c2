//! Component management for the ECS.
//!
//! Components are the typed values attached to entities. Each component type is assigned a dense
//! [`Id`] by the [`Registry`] the first time it is seen, and entity records store their
//! components as [`Values`]: a map from component [`Id`] to a shared, type-erased [`Value`].
//!
//! ## Architecture
//!
//! - [`Component`]: The trait that all component types must implement
//! - [`Id`]: A dense identifier for each registered component type
//! - [`Registry`]: Thread-safe registration and lookup of component types
//! - [`Values`]: One entity's components, keyed by component id
//! - [`Bundle`]: A statically typed group of components that can be encoded into [`Values`] and
//!   decoded back out of them
//!
//! ## Usage
//!
//! ```ignore
//! use tickworks::ecs::component::{Component, Registry};
//!
//! #[derive(Component, Clone)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = Registry::new();
//! let pos_id = registry.register::<Position>();
//! ```

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

mod bundle;
mod registry;

pub use bundle::{Bundle, Decoder, Encoder};
pub use registry::Registry;

/// A component identifier. Dense, assigned in registration order starting at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// A trait representing a component in the ECS.
///
/// Components are copyable values: queries hand out clones, and the store keeps its own copy.
pub trait Component: 'static + Clone + Send + Sync {}

/// A type-erased component value. Shared so that copying a record copies pointers, not data.
pub type Value = Arc<dyn Any + Send + Sync>;

/// The components of a single entity, keyed by component id.
#[derive(Clone, Default)]
pub struct Values {
    data: HashMap<Id, Value>,
}

impl Values {
    /// Create an empty component map.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// The number of components in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the map holds no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a component with the given id is present.
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.data.contains_key(&id)
    }

    /// Get the type-erased value for a component id.
    #[inline]
    pub fn get(&self, id: Id) -> Option<&Value> {
        self.data.get(&id)
    }

    /// Get a typed reference to a component, if present and of type `C`.
    #[inline]
    pub fn get_as<C: Component>(&self, id: Id) -> Option<&C> {
        self.data.get(&id).and_then(|value| value.downcast_ref::<C>())
    }

    /// Insert a value, returning the value it replaced.
    #[inline]
    pub fn insert(&mut self, id: Id, value: Value) -> Option<Value> {
        self.data.insert(id, value)
    }

    /// Remove a value, returning it if present.
    #[inline]
    pub fn remove(&mut self, id: Id) -> Option<Value> {
        self.data.remove(&id)
    }

    /// Iterate over the component ids present in the map.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.data.keys().copied()
    }

    /// Iterate over the `(id, value)` pairs in the map.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Value)> + '_ {
        self.data.iter().map(|(id, value)| (*id, value))
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.ids().collect();
        ids.sort();
        f.debug_struct("Values").field("components", &ids).finish()
    }
}
