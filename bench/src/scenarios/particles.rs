//! Particle system benchmark scenario.
//!
//! Simulates a particle swarm with:
//! - Components: Position, Velocity, Lifetime
//! - Systems: movement, lifetime decay, respawn of dead particles
//!
//! Every particle is rewritten each tick, so every cached query is invalidated and rebuilt. This
//! is the worst case for the materialization cache and measures:
//! - Dependency fan-out when many entities change
//! - Query materialization over a large store
//! - Entity spawn/despawn throughput (particles dying and respawning)

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tickworks::{
    core::{Config, Loop},
    ecs::{Entity, Query, Res, world::Handle},
};
use tickworks_macros::Asset;

use crate::{
    components::{DeltaTime, Lifetime, Position, Velocity},
    scenarios::Scenario,
};

/// Configuration for the particle benchmark.
pub struct ParticleConfig {
    /// Total number of particles to maintain.
    pub particle_count: usize,
    /// Simulated delta time per tick.
    pub delta_time: f32,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            delta_time: 1.0 / 60.0,
            seed: 12345,
        }
    }
}

#[derive(Asset)]
struct ParticleFactory(Mutex<ChaCha8Rng>);

impl ParticleFactory {
    fn create_particle(&self) -> (Position, Velocity, Lifetime) {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let pos = Position {
            x: rng.gen_range(-100.0..100.0),
            y: rng.gen_range(-100.0..100.0),
            z: rng.gen_range(-100.0..100.0),
        };
        let vel = Velocity {
            x: rng.gen_range(-10.0..10.0),
            y: rng.gen_range(-10.0..10.0),
            z: rng.gen_range(-10.0..10.0),
        };
        let lifetime = Lifetime {
            remaining: rng.gen_range(0.1..1.0),
            total: 1.0,
        };
        (pos, vel, lifetime)
    }
}

/// System: Update particle positions based on velocity.
fn system_movement(
    query: Query<(Entity, Position, Velocity)>,
    dt: Res<DeltaTime>,
    world: Res<Handle>,
) {
    let Some(world) = world.upgrade() else {
        return;
    };
    for (entity, pos, vel) in query.iter() {
        let moved = Position {
            x: pos.x + vel.x * dt.0,
            y: pos.y + vel.y * dt.0,
            z: pos.z + vel.z * dt.0,
        };
        world.attach(*entity, moved).unwrap();
    }
}

/// System: Decay lifetimes and replace dead particles with fresh ones.
fn system_lifetime_decay(
    query: Query<(Entity, Lifetime)>,
    dt: Res<DeltaTime>,
    factory: Res<ParticleFactory>,
    world: Res<Handle>,
) {
    let Some(world) = world.upgrade() else {
        return;
    };
    for (entity, life) in query.iter() {
        let remaining = life.remaining - dt.0;
        if remaining <= 0.0 {
            world.despawn(*entity);
            world.spawn(factory.create_particle());
        } else {
            world
                .attach(
                    *entity,
                    Lifetime {
                        remaining,
                        total: life.total,
                    },
                )
                .unwrap();
        }
    }
}

/// High-volume particle scenario driven through a [`Loop`]'s world.
pub struct ParticleScenario {
    config: ParticleConfig,
    game: Loop,
}

impl ParticleScenario {
    /// Create the scenario with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ParticleConfig::default())
    }

    /// Create the scenario with a custom configuration.
    pub fn with_config(config: ParticleConfig) -> Self {
        Self {
            config,
            game: Loop::new(Config::default()),
        }
    }
}

impl Default for ParticleScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario for ParticleScenario {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn description(&self) -> &'static str {
        "Particle swarm rewritten every tick, with short lifetimes and respawning"
    }

    fn entity_count(&self) -> usize {
        self.game.entity_count()
    }

    fn setup(&mut self) {
        let factory = ParticleFactory(Mutex::new(ChaCha8Rng::seed_from_u64(self.config.seed)));
        for _ in 0..self.config.particle_count {
            self.game.spawn(factory.create_particle());
        }
        self.game.asset(factory);
        self.game.asset(DeltaTime(self.config.delta_time));
        self.game.system(system_movement);
        self.game.system(system_lifetime_decay);
        self.game.validate().unwrap();
    }

    fn update(&mut self) {
        self.game.step().unwrap();
    }

    fn teardown(&mut self) {
        self.game = Loop::new(Config::default());
    }
}
