use std::time::Duration;

use tickworks::{
    core::{Config, Context, Loop},
    ecs::{Entity, Error, Query, Res, world::Handle},
};
use tickworks_macros::{Asset, Component};

#[derive(Component, Clone, Debug)]
struct Position {
    x: i32,
}

#[derive(Component, Clone, Debug)]
struct Velocity {
    dx: i32,
}

#[derive(Asset)]
struct Bounds {
    max: i32,
}

/// Seed the world on the first tick.
fn setup(world: Res<Handle>) {
    let Some(world) = world.upgrade() else {
        return;
    };
    for dx in 1..=3 {
        world.spawn((Position { x: 0 }, Velocity { dx }));
    }
    println!("Spawned {} movers", world.entity_count());
}

/// Move every entity, wrapping at the bounds.
fn movement(movers: Query<(Entity, Position, Velocity)>, bounds: Res<Bounds>, world: Res<Handle>) {
    let Some(world) = world.upgrade() else {
        return;
    };
    for (entity, position, velocity) in movers.iter() {
        let x = (position.x + velocity.dx) % bounds.max;
        // Attaching invalidates this system's cached query, so next tick sees the new positions.
        let _ = world.attach(*entity, Position { x });
    }
}

/// Print the positions. Only rematerializes when a position changed.
fn report(positions: Query<(Entity, Position)>) {
    let line: Vec<String> = positions
        .iter()
        .map(|(entity, position)| format!("{entity}: {}", position.x))
        .collect();
    println!("{}", line.join(", "));
}

fn main() {
    let game = Loop::new(Config::from_hz(10));
    game.asset(Bounds { max: 10 });
    game.init_system(setup);
    game.system(movement);
    game.system(report);

    let ctx = Context::background().with_timeout(Duration::from_secs(2));
    match game.run(&ctx) {
        Err(Error::DeadlineExceeded) => println!("Done"),
        Err(err) => eprintln!("Loop failed: {err}"),
        Ok(()) => {}
    }
}
