use std::sync::Arc;

use log::debug;

use crate::ecs::{
    cache::Cache,
    error::{Error, Result},
    system::{Argument, Input, System},
    world::World,
};

/// One input of a scheduled system: its cache and the argument last materialized under it.
pub(crate) struct Slot {
    cache: Arc<Cache>,
    input: Input,
    argument: Option<Argument>,
}

impl Slot {
    fn new(input: Input) -> Self {
        Self {
            cache: Arc::new(Cache::new()),
            input,
            argument: None,
        }
    }

    /// Rematerialize the argument if the cache was reset since the last time.
    fn refresh(&mut self, world: &World, system: &'static str, index: usize) {
        let Slot {
            cache,
            input,
            argument,
        } = self;
        cache.do_once(|| {
            *argument = world.materialize(input, cache);
            match (&*argument, &*input) {
                (Some(_), Input::Query(query)) => {
                    debug!("Materialized query {} for {system}[{index}]", query.bundle)
                }
                (Some(_), Input::Asset(key)) => {
                    debug!("Materialized asset {} for {system}[{index}]", key.name())
                }
                (None, _) => debug!("Input {index} of {system} is unavailable"),
            }
        });
    }

    /// The error reported when this slot has no argument.
    fn unavailable(&self, system: &'static str) -> Error {
        let asset = match &self.input {
            Input::Asset(key) => key.name(),
            Input::Query(query) => query.bundle,
        };
        Error::MissingAsset { system, asset }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }
}

/// A system in the roster, with one slot per declared input.
pub(crate) struct Entry {
    system: System,
    slots: Vec<Slot>,
}

impl Entry {
    pub(crate) fn new(system: System) -> Self {
        let slots = system.inputs().iter().cloned().map(Slot::new).collect();
        Self { system, slots }
    }

    #[inline]
    pub(crate) fn system(&self) -> &System {
        &self.system
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Bring every slot up to date, then run the system.
    ///
    /// Fails without running the system if any input is unavailable.
    pub(crate) fn run(&mut self, world: &World) -> Result<()> {
        let name = self.system.name();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.refresh(world, name, index);
        }

        let mut args = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            match &slot.argument {
                Some(argument) => args.push(Arc::clone(argument)),
                None => return Err(slot.unavailable(name)),
            }
        }

        self.system.run(&args);
        Ok(())
    }

    /// Unlink every slot from the world's dependency closure.
    pub(crate) fn retire(self, world: &World) {
        for slot in &self.slots {
            world.forget(&slot.cache);
        }
        debug!("Retired one-shot system {}", self.system.name());
    }
}
