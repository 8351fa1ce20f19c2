//! The schedule: registered systems and the per-tick algorithm running them.
//!
//! # Lifecycle
//!
//! ```text
//!  push ──► Pending ──step──► Active ──(once, after a successful run)──► Retired
//!                               ▲  │
//!                               └──┘ recurring
//! ```
//!
//! Systems pushed while a step is in progress stay pending until the next step.
//!
//! # Step
//!
//! Each step drains the pending queue into the roster, then runs every active system in
//! registration order. Before a system runs, each of its slots asks its cache to rematerialize the
//! slot's argument; the cache only lets that happen once per generation, so arguments are reused
//! across steps until a world mutation resets them.
//!
//! A system whose asset input is missing is skipped for the step and stays in the roster. The
//! step still runs the remaining systems and reports the first such failure.
//!
//! # Thread Safety
//!
//! Registration may happen from any thread, including from inside a running system. Steps are
//! serialized by the roster lock. A system must not call [`World::step`] on its own world.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use log::{debug, error};

use crate::ecs::{
    asset,
    error::{Error, Result},
    system::System,
    world::World,
};

mod entry;

use entry::Entry;

/// Registered systems, pending and active.
#[derive(Default)]
pub struct Schedule {
    /// Systems registered since the last step.
    pending: Mutex<Vec<System>>,

    /// Active systems, in registration order.
    roster: Mutex<Vec<Entry>>,

    /// Mirror of the roster length, readable while a step holds the roster.
    active: AtomicUsize,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a system. It becomes active at the next step.
    pub fn push(&self, system: System) {
        debug!(
            "Registered {:?} system {} with {} inputs",
            system.mode(),
            system.name(),
            system.inputs().len()
        );
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(system);
    }

    /// The number of systems waiting for the next step.
    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The number of active systems as of the end of the last step.
    pub fn len(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Whether no systems are active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check every pending and active system's asset inputs against `registered`.
    ///
    /// Must not be called from inside a running system.
    pub fn validate(&self, registered: impl Fn(&asset::Key) -> bool) -> Result<()> {
        // Same order as `step`: roster, then pending.
        let roster = self.roster.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let systems = roster.iter().map(Entry::system).chain(pending.iter());
        for system in systems {
            if let Some(key) = system.assets().find(|key| !registered(key)) {
                return Err(Error::MissingAsset {
                    system: system.name(),
                    asset: key.name(),
                });
            }
        }
        Ok(())
    }

    /// Run one tick against `world`.
    ///
    /// Returns the first error encountered. Systems after a failing one still run.
    pub fn step(&self, world: &World) -> Result<()> {
        let mut roster = self.roster.lock().unwrap_or_else(PoisonError::into_inner);

        let pending = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if !pending.is_empty() {
            debug!("Activating {} pending systems", pending.len());
            roster.extend(pending.into_iter().map(Entry::new));
        }

        let mut first_error = None;
        let mut retired = Vec::new();
        let mut index = 0;
        while index < roster.len() {
            match roster[index].run(world) {
                Ok(()) if roster[index].system().is_once() => {
                    retired.push(roster.remove(index));
                    continue;
                }
                Ok(()) => {}
                Err(err) => {
                    error!("Skipping system: {err}");
                    first_error.get_or_insert(err);
                }
            }
            index += 1;
        }

        self.active.store(roster.len(), Ordering::Release);
        drop(roster);

        for entry in retired {
            entry.retire(world);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Run `inspect` over the active roster.
    #[cfg(test)]
    fn with_roster<R>(&self, inspect: impl FnOnce(&[Entry]) -> R) -> R {
        inspect(&self.roster.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
