//! Systems: functions run by the schedule every tick.
//!
//! # Overview
//!
//! A system is any function whose parameters implement [`Parameter`]. Each parameter declares one
//! [`Input`], resolved once when the system is registered:
//!
//! - [`Query<B>`]: every entity carrying all of bundle `B`'s components, decoded into `B`s.
//! - [`Res<A>`]: the current value of asset `A`.
//!
//! ```rust,ignore
//! use tickworks::ecs::{Query, Res};
//!
//! fn report(bodies: Query<(Entity, Position)>, config: Res<Config>) {
//!     for (entity, position) in bodies.iter() {
//!         println!("{entity} at {} (level {})", position.x, config.level);
//!     }
//! }
//!
//! world.system(report);
//! ```
//!
//! # Cached Arguments
//!
//! Arguments are materialized by the schedule and cached per system and per parameter. A system
//! keeps receiving the same shared argument tick after tick until something it read changes: an
//! entity it was handed, a new entity carrying one of its component types, or an asset it uses.
//! Parameters therefore give read-only access; changes go back through the
//! [`World`](crate::ecs::World).
//!
//! # Modes
//!
//! A [`Mode::Recurring`] system runs every tick. A [`Mode::Once`] system runs on the first tick
//! where all its inputs are available and is then dropped from the schedule.

use std::{any::Any, fmt, sync::Arc};

use crate::ecs::{
    asset,
    component::{Id, Registry},
    storage::Row,
};

pub mod function;
pub mod param;

pub use function::WithSystemParams;
pub use param::{Parameter, Query, Res};

/// A materialized, shared system argument.
pub type Argument = Arc<dyn Any + Send + Sync>;

/// Decodes listed rows into a query argument.
pub type DecodeFn = fn(&Registry, &[Row]) -> Argument;

/// A query input: the component types to list and how to decode the rows.
#[derive(Clone)]
pub struct QueryInput {
    /// Component types every listed entity must carry.
    pub components: Vec<Id>,

    /// Builds the argument from the listed rows.
    pub decode: DecodeFn,

    /// The bundle's type name, for diagnostics.
    pub bundle: &'static str,
}

/// What a system parameter reads.
#[derive(Clone)]
pub enum Input {
    /// A sequence of component bundles.
    Query(QueryInput),

    /// A singleton asset.
    Asset(asset::Key),
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Query(query) => f
                .debug_struct("Query")
                .field("bundle", &query.bundle)
                .field("components", &query.components)
                .finish(),
            Input::Asset(key) => f.debug_tuple("Asset").field(&key.name()).finish(),
        }
    }
}

/// Whether a system runs every tick or only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run on the first tick its inputs are available, then retire.
    Once,

    /// Run every tick.
    Recurring,
}

/// A registered system: its inputs and the function consuming them.
pub struct System {
    /// Diagnostic name.
    name: &'static str,

    /// Declared inputs, in parameter order.
    inputs: Vec<Input>,

    /// Once or recurring.
    mode: Mode,

    /// The system body, called with one argument per input.
    run: Box<dyn FnMut(&[Argument]) + Send + 'static>,
}

impl System {
    /// Create a system from explicit inputs and a body taking one argument per input.
    pub fn new(
        name: &'static str,
        inputs: Vec<Input>,
        mode: Mode,
        run: impl FnMut(&[Argument]) + Send + 'static,
    ) -> Self {
        Self {
            name,
            inputs,
            mode,
            run: Box::new(run),
        }
    }

    /// The system's name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared inputs, in parameter order.
    #[inline]
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    /// The system's mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the system retires after one run.
    #[inline]
    pub fn is_once(&self) -> bool {
        self.mode == Mode::Once
    }

    /// The asset keys among the system's inputs.
    pub fn assets(&self) -> impl Iterator<Item = &asset::Key> + '_ {
        self.inputs.iter().filter_map(|input| match input {
            Input::Asset(key) => Some(key),
            Input::Query(_) => None,
        })
    }

    /// Run the system body.
    ///
    /// # Panics
    ///
    /// If `args` does not hold exactly one argument of the right type per input.
    pub fn run(&mut self, args: &[Argument]) {
        (self.run)(args)
    }
}

impl fmt::Debug for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// A trait for converting types into systems.
pub trait IntoSystem<Marker>: Sized {
    /// Convert into a system, resolving its inputs against the component registry.
    fn into_system(self, registry: &Registry, mode: Mode) -> System;
}

impl IntoSystem<System> for System {
    fn into_system(mut self, _registry: &Registry, mode: Mode) -> System {
        self.mode = mode;
        self
    }
}
