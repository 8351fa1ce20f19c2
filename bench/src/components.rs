//! Common component and asset types used across benchmarks.

use tickworks_macros::{Asset, Component};

/// 3D position component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Remaining lifetime of a particle, in seconds.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
    pub total: f32,
}

/// Marker for entities that no system reads.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Inert;

/// Simulated seconds per tick.
#[derive(Asset, Clone, Copy, Debug)]
pub struct DeltaTime(pub f32);
