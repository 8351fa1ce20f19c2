//! Cancellation contexts.
//!
//! A [`Context`] ends when any of its cancellation channels disconnects or its deadline passes.
//! Contexts are cheap to clone and every clone observes the same end. Deriving a context keeps
//! the parent's cancellation channels and deadline, so ending a parent ends every context derived
//! from it.
//!
//! ```rust,ignore
//! let (ctx, cancel) = Context::background().with_cancel();
//! let ctx = ctx.with_timeout(Duration::from_secs(5));
//!
//! thread::spawn(move || game_loop.run(&ctx));
//! cancel.cancel();
//! ```

use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, Select, Sender, TryRecvError};

use crate::ecs::{Error, Result};

/// A cancellation signal with an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Each receiver disconnects when its [`Canceller`] fires.
    done: Vec<Receiver<()>>,

    /// When the context expires, if ever.
    deadline: Option<Instant>,
}

/// Ends the context it was created with. Dropping it has the same effect as [`cancel`].
///
/// [`cancel`]: Canceller::cancel
#[derive(Debug)]
pub struct Canceller {
    sender: Mutex<Option<Sender<()>>>,
}

impl Canceller {
    /// End the context. Idempotent.
    pub fn cancel(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl Context {
    /// A context that never ends.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that also ends when the returned [`Canceller`] fires.
    pub fn with_cancel(&self) -> (Context, Canceller) {
        let (sender, receiver) = channel::bounded(0);
        let mut child = self.clone();
        child.done.push(receiver);
        let canceller = Canceller {
            sender: Mutex::new(Some(sender)),
        };
        (child, canceller)
    }

    /// Derive a context that also ends at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        child
    }

    /// Derive a context that also ends after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context ended, or `None` while it is live. Cancellation wins over the deadline.
    pub fn err(&self) -> Option<Error> {
        let cancelled = self
            .done
            .iter()
            .any(|done| matches!(done.try_recv(), Err(TryRecvError::Disconnected)));
        if cancelled {
            Some(Error::Cancelled)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(Error::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Whether the context has ended.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Block until the context ends, returning why.
    pub fn wait(&self) -> Error {
        match self.recv(&channel::never::<()>()) {
            Err(err) => err,
            Ok(()) => Error::Cancelled,
        }
    }

    /// Receive from `receiver`, unless the context ends first.
    ///
    /// A disconnected `receiver` is reported as [`Error::Cancelled`].
    pub fn recv<T>(&self, receiver: &Receiver<T>) -> Result<T> {
        if let Some(err) = self.err() {
            return Err(err);
        }

        let deadline = self.deadline.map(channel::at);
        let mut select = Select::new();
        let target = select.recv(receiver);
        for done in &self.done {
            select.recv(done);
        }
        if let Some(deadline) = &deadline {
            select.recv(deadline);
        }

        let operation = select.select();
        let index = operation.index();
        if index == target {
            return operation.recv(receiver).map_err(|_| Error::Cancelled);
        }
        match self.done.get(index - 1) {
            Some(done) => {
                let _ = operation.recv(done);
                Err(Error::Cancelled)
            }
            None => {
                if let Some(deadline) = &deadline {
                    let _ = operation.recv(deadline);
                }
                Err(Error::DeadlineExceeded)
            }
        }
    }
}
