//! # Tickworks
//!
//! A small entity-component-system runtime built around a fixed-tick scheduler.
//!
//! Systems declare what they read (sequences of component bundles, or singleton assets) through
//! their parameter types. Each declared input is materialized into a per-system argument slot that
//! is cached across ticks and only recomputed after something it read has changed. Invalidation is
//! tracked through a dependency closure mapping entity and asset identities to the caches that
//! read them.
//!
//! ```rust,ignore
//! use tickworks::ecs::{Query, Res, World};
//! use tickworks_macros::{Asset, Component};
//!
//! #[derive(Component, Clone)]
//! struct Position { x: f32 }
//!
//! #[derive(Asset)]
//! struct Gravity(f32);
//!
//! fn report(positions: Query<Position>, gravity: Res<Gravity>) {
//!     for pos in positions.iter() {
//!         println!("x = {} (g = {})", pos.x, gravity.0);
//!     }
//! }
//!
//! let world = World::new();
//! world.asset(Gravity(9.8));
//! world.spawn(Position { x: 0.0 });
//! world.system(report);
//! world.step()?;
//! ```

// Allow the derive macros to refer to `::tickworks` from inside this crate.
extern crate self as tickworks;

pub mod core;
pub mod ecs;
