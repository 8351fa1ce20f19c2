//! A resettable one-shot execution gate.
//!
//! A [`Cache`] runs a computation at most once per *generation*. Any number of threads may call
//! [`Cache::do_once`] concurrently; exactly one of them runs the body while the rest wait for it
//! to finish. [`Cache::reset`] starts a new generation so that the next `do_once` runs again.
//!
//! ```text
//!            reset()                 do_once(f)
//!   Fresh(g) ───────► Stale(g + 1) ─────────────► Fresh(g + 1)
//!      ▲                                              │
//!      └──────────────── do_once(f) is a no-op ◄──────┘
//! ```
//!
//! # Concurrency
//!
//! The current gate lives behind a reader/writer lock. `do_once` holds the read lock for its whole
//! duration, so concurrent callers share one execution and a `reset` can never swap the gate out
//! from under a running body. `reset` takes the write lock: it waits for in-flight bodies to
//! complete under their own generation, and only callers arriving afterwards see the new one.

use std::sync::{Once, PoisonError};

use crossbeam::sync::ShardedLock;

/// One generation of a [`Cache`].
struct Gate {
    generation: u64,
    once: Once,
}

impl Gate {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            once: Once::new(),
        }
    }
}

/// A resettable variant of [`Once`].
pub struct Cache {
    gate: ShardedLock<Gate>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    /// Create a cache in generation zero, not yet computed.
    pub fn new() -> Self {
        Self {
            gate: ShardedLock::new(Gate::new(0)),
        }
    }

    /// Run `f` unless it already ran in the current generation.
    ///
    /// All callers within a generation return only after the single execution completes. If `f`
    /// panics the panic propagates and the generation stays uncomputed, so the next call retries.
    pub fn do_once(&self, f: impl FnOnce()) {
        // The read lock excludes `reset` for the duration of the body.
        let gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        gate.once.call_once_force(|_| f());
    }

    /// Begin a new generation, so that the next [`do_once`](Self::do_once) runs its body again.
    ///
    /// Resetting a cache whose current generation has not been computed is a no-op.
    pub fn reset(&self) {
        let mut gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        if gate.once.is_completed() {
            *gate = Gate::new(gate.generation + 1);
        }
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Whether the current generation has been computed.
    pub fn is_fresh(&self) -> bool {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .once
            .is_completed()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Cache")
            .field("generation", &gate.generation)
            .field("fresh", &gate.once.is_completed())
            .finish()
    }
}
