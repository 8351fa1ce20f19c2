//! The fixed-period loop driving a world, and the contexts that stop it.

pub mod context;
pub mod sim_loop;
pub mod time;

pub use context::{Canceller, Context};
pub use sim_loop::{Config, Loop};
