//! The entity-component-system core: entity storage, cached system inputs, and the tick schedule.
//!
//! A [`World`] owns the entities, assets, registered systems and the dependency closure linking
//! each system's cached inputs to the entities, component types and assets they were built from.

pub mod asset;
pub mod cache;
pub mod component;
pub mod dep;
pub mod entity;
pub mod error;
pub mod schedule;
pub mod storage;
pub mod system;
pub(crate) mod util;
pub mod world;

pub use asset::Asset;
pub use cache::Cache;
pub use component::{Bundle, Component};
pub use entity::Entity;
pub use error::{Error, Result};
pub use schedule::Schedule;
pub use world::World;

pub use system::{IntoSystem, Mode, Parameter, Query, Res, System};
