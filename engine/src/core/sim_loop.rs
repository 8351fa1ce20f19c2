use std::{ops::Deref, sync::Arc, time::Duration};

use crossbeam::channel;
use log::{error, info};

use crate::{
    core::{context::Context, time},
    ecs::{Result, World, world::Handle},
};

/// Loop configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Time between ticks.
    pub period: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            period: Duration::from_nanos(time::SIXTY_FPS),
        }
    }
}

impl Config {
    /// Tick `hz` times per second.
    pub fn from_hz(hz: u32) -> Self {
        Self {
            period: time::period_of(hz),
        }
    }

    /// Tick every `period`.
    pub fn with_period(self, period: Duration) -> Self {
        Self { period }
    }
}

/// A world stepped on a fixed period.
///
/// The world holds a [`Handle`] to itself as an asset, so systems can take `Res<Handle>` to reach
/// it. The loop dereferences to its [`World`] for registration and mutation.
pub struct Loop {
    world: Arc<World>,
    config: Config,
}

impl Loop {
    /// Create a loop around a fresh world.
    pub fn new(config: Config) -> Self {
        let world = Arc::new(World::new());
        world.asset(Handle::new(&world));
        Self { world, config }
    }

    /// The world being stepped.
    #[inline]
    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// The loop configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Step the world every period until `ctx` ends.
    ///
    /// Returns the context's error once it ends, or the first failing step's error.
    pub fn run(&self, ctx: &Context) -> Result<()> {
        info!("Starting loop with a period of {:?}", self.config.period);
        let ticker = channel::tick(self.config.period);
        let mut ticks: u64 = 0;
        loop {
            if let Err(err) = ctx.recv(&ticker) {
                info!("Ending loop after {ticks} ticks: {err}");
                return Err(err);
            }
            if let Err(err) = self.world.step() {
                error!("Ending loop after {ticks} ticks: {err}");
                return Err(err);
            }
            ticks += 1;
        }
    }
}

impl Default for Loop {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Deref for Loop {
    type Target = World;

    fn deref(&self) -> &World {
        &self.world
    }
}
