//! Asset (singleton) types for the ECS.
//!
//! This module provides the [`Asset`] trait for types that exist as singletons in the world:
//! exactly one value per type, stored independently of any entity.
//!
//! # Asset vs Component
//!
//! | Aspect | Asset | Component |
//! |--------|-------|-----------|
//! | Cardinality | One per type per world | Many per type (one per entity) |
//! | Access | Direct by type (`Res<T>`) | Query over matching entities (`Query<T>`) |
//! | Replacement | Full overwrite | Merge into an entity record |
//!
//! # Example
//!
//! ```rust,ignore
//! use tickworks_macros::Asset;
//!
//! #[derive(Asset)]
//! struct Config {
//!     level: u32,
//! }
//!
//! world.asset(Config { level: 1 });
//!
//! fn report(config: Res<Config>) {
//!     println!("level {}", config.level);
//! }
//! ```

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

/// A trait for singleton types in the ECS.
///
/// # Derive Macro
///
/// Use `#[derive(Asset)]` to implement this trait.
///
/// # Trait Bounds
///
/// - `'static`: No borrowed data
/// - `Send + Sync`: Shared with systems on whichever thread runs the tick
pub trait Asset: 'static + Send + Sync {}

/// The identity of an asset type. Compares by [`TypeId`]; carries the type name for diagnostics.
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    name: &'static str,
}

impl Key {
    /// The key for asset type `A`.
    #[inline]
    pub fn of<A: Asset>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            name: type_name::<A>(),
        }
    }

    /// The asset's [`TypeId`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The asset's Rust type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}
