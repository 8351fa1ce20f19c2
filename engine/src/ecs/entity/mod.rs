//! Entity identity for the ECS.
//!
//! An [`Entity`] is an opaque, strictly increasing identifier assigned when the entity is
//! created. Identifiers are never reused, even after the entity is deleted, so an [`Entity`] held
//! past the lifetime of its record can never alias a newer entity. This trades a compact id space
//! for not needing generation tracking: a stale id simply finds no record.
//!
//! The identifier is itself a component. Every entity record carries its own [`Entity`] value,
//! which makes it queryable like any other component:
//!
//! ```rust,ignore
//! fn report(rows: Query<(Entity, Position)>) {
//!     for (entity, pos) in rows.iter() {
//!         println!("{entity}: {}", pos.x);
//!     }
//! }
//! ```

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::ecs::component::Component;

/// An entity identifier. Non-zero, unique within an [`Allocator`] and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u64);

impl Entity {
    /// Construct an entity from a raw identifier.
    ///
    /// This is primarily useful for tests and for referring to entities that may not exist.
    #[inline]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw identifier value.
    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl Component for Entity {}

/// An allocator for entity identifiers.
///
/// Allocation is a single atomic increment, so it is safe to share between threads. The first
/// allocated entity is `Entity(1)`.
#[derive(Default, Debug)]
pub struct Allocator {
    /// The last identifier handed out.
    last_id: AtomicU64,
}

impl Allocator {
    /// Construct a new entity allocator.
    #[inline]
    pub const fn new() -> Self {
        Self {
            last_id: AtomicU64::new(0),
        }
    }

    /// Allocate the next entity identifier.
    #[inline]
    pub fn alloc(&self) -> Entity {
        Entity(self.last_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The number of identifiers handed out so far.
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.last_id.load(Ordering::Relaxed)
    }
}
