//! The World is the central container for all entities, assets, and systems in the ECS.
//!
//! A `World` owns the entity store, the asset storage, the dependency closure linking both to the
//! caches computed from them, and the schedule of systems reading them. Every method takes
//! `&self`: a world is shared between the loop driving it and any thread mutating it.
//!
//! # Invalidation
//!
//! Each system input is materialized under a [`Cache`] and linked into the closure against what
//! it read. Mutations reset the caches linked to what they touched:
//!
//! | Mutation | Keys reset |
//! |----------|------------|
//! | [`spawn`](World::spawn) | every component type the new entity carries |
//! | [`attach`](World::attach) | the entity, and component types it did not carry before |
//! | [`detach`](World::detach) | the entity |
//! | [`despawn`](World::despawn) | the entity (whose links are then dropped) |
//! | [`asset`](World::asset) | the asset |
//!
//! # Locking
//!
//! Entity and asset data sit behind one reader/writer lock. Materialization lists and links while
//! holding the read lock; mutators change data and collect the caches to reset while holding the
//! write lock, then reset after releasing it. A cache is never reset while any world lock is held,
//! because resetting waits for in-flight materializations that themselves need those locks.
//!
//! # Example
//!
//! ```ignore
//! use tickworks::ecs::{Query, World};
//!
//! let world = World::new();
//! let entity = world.spawn(Position { x: 0 });
//!
//! world.system(|positions: Query<Position>| {
//!     for position in &positions {
//!         println!("x = {}", position.x);
//!     }
//! });
//!
//! world.step()?;
//! world.attach(entity, Position { x: 5 })?;
//! world.step()?;
//! ```

use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use log::trace;

use crate::ecs::{
    asset::Asset,
    cache::Cache,
    component::{Bundle, Component, Registry, Values},
    dep::{Closure, Key},
    entity::Entity,
    error::Result,
    schedule::Schedule,
    storage::{Assets, ObjectStore},
    system::{Argument, Input, IntoSystem, Mode},
};

/// Entity and asset data, guarded together.
struct Data {
    objects: ObjectStore,
    assets: Assets,
}

/// The World is the central container for all entities, assets, and systems.
pub struct World {
    /// Component types known to the world.
    components: Registry,

    /// Entity records and assets.
    data: RwLock<Data>,

    /// Which caches read which entities, component types and assets.
    closure: Mutex<Closure>,

    /// Registered systems.
    schedule: Schedule,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        let components = Registry::new();
        let objects = ObjectStore::new(&components);
        Self {
            components,
            data: RwLock::new(Data {
                objects,
                assets: Assets::new(),
            }),
            closure: Mutex::new(Closure::new()),
            schedule: Schedule::new(),
        }
    }

    /// The world's component registry.
    #[inline]
    pub fn components(&self) -> &Registry {
        &self.components
    }

    /// Register an asset, replacing any previous value of its type.
    pub fn asset<A: Asset>(&self, value: A) {
        let dependents = {
            let mut data = self.write();
            let key = data.assets.insert(value);
            self.closure().dependents(&Key::Asset(key))
        };
        reset(dependents);
    }

    /// The current value of asset `A`.
    pub fn get_asset<A: Asset>(&self) -> Option<Arc<A>> {
        self.read().assets.get::<A>()
    }

    /// Register a system to run every tick, starting with the next one.
    pub fn system<M>(&self, system: impl IntoSystem<M>) {
        self.add_system(system, Mode::Recurring);
    }

    /// Register a system to run once, on the next tick where its inputs are available.
    pub fn init_system<M>(&self, system: impl IntoSystem<M>) {
        self.add_system(system, Mode::Once);
    }

    /// Register a system with an explicit mode.
    pub fn add_system<M>(&self, system: impl IntoSystem<M>, mode: Mode) {
        self.schedule.push(system.into_system(&self.components, mode));
    }

    /// Spawn an entity from a bundle.
    ///
    /// # Panics
    ///
    /// If the bundle contains a component type more than once.
    pub fn spawn<B: Bundle>(&self, bundle: B) -> Entity {
        self.try_spawn(bundle)
            .unwrap_or_else(|err| panic!("Cannot spawn entity: {err}"))
    }

    /// Spawn an entity from a bundle, failing if the bundle cannot be encoded.
    pub fn try_spawn<B: Bundle>(&self, bundle: B) -> Result<Entity> {
        let values = bundle.into_values(&self.components)?;
        let (entity, dependents) = {
            let mut data = self.write();
            let entity = data.objects.create(values);
            let keys: Vec<Key> = data
                .objects
                .get(entity)
                .map(|record| record.ids().map(Key::Component).collect())
                .unwrap_or_default();
            (entity, self.dependents_of(&keys))
        };
        reset(dependents);
        Ok(entity)
    }

    /// Merge a bundle into an existing entity, overwriting components of the same types.
    ///
    /// Attaching to an entity that does not exist does nothing. Fails, changing nothing, if the
    /// bundle cannot be encoded.
    pub fn attach<B: Bundle>(&self, entity: Entity, bundle: B) -> Result<()> {
        let values = bundle.into_values(&self.components)?;
        let dependents = {
            let mut data = self.write();
            let Some(added) = data.objects.update(entity, values, &[]) else {
                trace!("Ignoring attach to missing {entity}");
                return Ok(());
            };
            let keys: Vec<Key> = std::iter::once(Key::Entity(entity))
                .chain(added.into_iter().map(Key::Component))
                .collect();
            self.dependents_of(&keys)
        };
        reset(dependents);
        Ok(())
    }

    /// Remove bundle `B`'s component types from an entity. Returns whether the entity exists.
    pub fn detach<B: Bundle>(&self, entity: Entity) -> bool {
        let remove = B::component_ids(&self.components);
        let dependents = {
            let mut data = self.write();
            if data.objects.update(entity, Values::new(), &remove).is_none() {
                return false;
            }
            self.closure().dependents(&Key::Entity(entity))
        };
        reset(dependents);
        true
    }

    /// Remove an entity. Returns whether it existed.
    pub fn despawn(&self, entity: Entity) -> bool {
        let dependents = {
            let mut data = self.write();
            if data.objects.delete(entity).is_none() {
                return false;
            }
            let key = Key::Entity(entity);
            let mut closure = self.closure();
            let dependents = closure.dependents(&key);
            closure.flush(&key);
            dependents
        };
        reset(dependents);
        true
    }

    /// A copy of the entity's component `C`.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<C> {
        let id = self.components.get::<C>()?;
        self.read().objects.get(entity)?.get_as::<C>(id).cloned()
    }

    /// Whether the entity exists.
    pub fn contains(&self, entity: Entity) -> bool {
        self.read().objects.contains(entity)
    }

    /// The number of live entities.
    pub fn entity_count(&self) -> usize {
        self.read().objects.len()
    }

    /// The number of active systems.
    pub fn system_count(&self) -> usize {
        self.schedule.len()
    }

    /// The number of systems waiting for the next tick.
    pub fn pending_count(&self) -> usize {
        self.schedule.pending_len()
    }

    /// The number of keys some cache currently depends on.
    pub fn dependency_count(&self) -> usize {
        self.closure().len()
    }

    /// Check that every registered system's asset inputs are available.
    ///
    /// Must not be called from inside a running system.
    pub fn validate(&self) -> Result<()> {
        self.schedule
            .validate(|key| self.read().assets.contains(key))
    }

    /// Run one tick of the schedule.
    pub fn step(&self) -> Result<()> {
        self.schedule.step(self)
    }

    /// Compute the argument for `input`, linking `cache` to everything it read.
    ///
    /// Returns `None` when an asset input has no value. The cache is still linked to the asset, so
    /// registering it later resets the cache.
    pub(crate) fn materialize(&self, input: &Input, cache: &Arc<Cache>) -> Option<Argument> {
        let data = self.read();
        match input {
            Input::Query(query) => {
                let rows = data.objects.list(&query.components);
                let keys = query
                    .components
                    .iter()
                    .map(|&id| Key::Component(id))
                    .chain(rows.iter().map(|row| Key::Entity(row.entity)));
                self.closure().relink(cache, keys);
                Some((query.decode)(&self.components, &rows))
            }
            Input::Asset(key) => {
                self.closure().relink(cache, [Key::Asset(*key)]);
                data.assets.get_by_key(key)
            }
        }
    }

    /// Unlink a cache from everything it depends on.
    pub(crate) fn forget(&self, cache: &Arc<Cache>) {
        self.closure().forget(cache);
    }

    fn read(&self) -> RwLockReadGuard<'_, Data> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Data> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn closure(&self) -> MutexGuard<'_, Closure> {
        self.closure.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dependents_of(&self, keys: &[Key]) -> Vec<Arc<Cache>> {
        let closure = self.closure();
        keys.iter().flat_map(|key| closure.dependents(key)).collect()
    }
}

/// Reset every cache collected from the closure. Must be called without holding world locks.
fn reset(dependents: Vec<Arc<Cache>>) {
    if !dependents.is_empty() {
        trace!("Resetting {} dependents", dependents.len());
    }
    for cache in dependents {
        cache.reset();
    }
}

/// A weak reference to a world, registered as an asset so systems can reach their own world.
///
/// ```ignore
/// fn spawner(world: Res<Handle>) {
///     if let Some(world) = world.upgrade() {
///         world.spawn(Position { x: 0 });
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Handle(Weak<World>);

impl Handle {
    /// A handle to `world`.
    pub fn new(world: &Arc<World>) -> Self {
        Self(Arc::downgrade(world))
    }

    /// The world, if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<World>> {
        self.0.upgrade()
    }
}

impl Asset for Handle {}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entity_count())
            .field("systems", &self.system_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use tickworks_macros::{Asset, Bundle, Component};

    use super::*;
    use crate::ecs::{
        error::Error,
        system::{Query, Res},
    };

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Position {
        x: i32,
    }

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Velocity {
        dx: i32,
    }

    #[derive(Bundle)]
    struct Twice {
        first: Position,
        second: Position,
    }

    #[derive(Asset)]
    struct Config {
        level: u32,
    }

    fn observe<B: Bundle + Clone>(world: &World) -> Arc<Mutex<Vec<Vec<B>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        world.system(move |items: Query<B>| sink.lock().unwrap().push(items.to_vec()));
        seen
    }

    #[test]
    fn attach_invalidates_cached_query() {
        // Given
        let world = World::new();
        let entity = world.spawn(Position { x: 0 });
        let seen = observe::<Position>(&world);
        world.step().unwrap();

        // When
        world.attach(entity, Position { x: 5 }).unwrap();
        world.step().unwrap();

        // Then
        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec![Position { x: 0 }], vec![Position { x: 5 }]]
        );
    }

    #[test]
    fn spawn_invalidates_queries_over_its_types() {
        // Given
        let world = World::new();
        world.spawn(Position { x: 1 });
        let seen = observe::<Position>(&world);
        world.step().unwrap();

        // When
        world.spawn((Position { x: 2 }, Velocity { dx: 1 }));
        world.step().unwrap();

        // Then
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[1], vec![Position { x: 1 }, Position { x: 2 }]);
    }

    #[test]
    fn attach_new_type_invalidates_queries_over_it() {
        // Given
        let world = World::new();
        let entity = world.spawn(Position { x: 1 });
        let seen = observe::<(Position, Velocity)>(&world);
        world.step().unwrap();

        // When
        world.attach(entity, Velocity { dx: 3 }).unwrap();
        world.step().unwrap();

        // Then
        let seen = seen.lock().unwrap();
        assert!(seen[0].is_empty());
        assert_eq!(seen[1], vec![(Position { x: 1 }, Velocity { dx: 3 })]);
    }

    #[test]
    fn detach_and_despawn_invalidate() {
        // Given
        let world = World::new();
        let kept = world.spawn(Position { x: 1 });
        let dropped = world.spawn(Position { x: 2 });
        let detached = world.spawn(Position { x: 3 });
        let seen = observe::<Position>(&world);
        world.step().unwrap();

        // When
        assert!(world.despawn(dropped));
        assert!(world.detach::<Position>(detached));
        world.step().unwrap();

        // Then
        assert_eq!(seen.lock().unwrap()[1], vec![Position { x: 1 }]);
        assert!(!world.contains(dropped));
        assert!(world.contains(detached));
        assert_eq!(world.get::<Position>(kept), Some(Position { x: 1 }));
        assert!(!world.despawn(dropped));
    }

    #[test]
    fn unrelated_mutation_keeps_cache() {
        // Given
        let world = World::new();
        world.spawn(Position { x: 1 });
        let other = world.spawn(Velocity { dx: 1 });
        let seen = observe::<Position>(&world);
        world.step().unwrap();

        // When - Neither the entity nor its types are read by the query
        world.attach(other, Velocity { dx: 2 }).unwrap();
        world.step().unwrap();

        // Then - The same materialized argument was handed out twice
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert_eq!(world.get::<Velocity>(other), Some(Velocity { dx: 2 }));
    }

    #[test]
    fn attach_to_unknown_entity_is_noop() {
        // Given
        let world = World::new();

        // When
        let result = world.attach(Entity::from_raw(77), Position { x: 1 });

        // Then
        assert!(result.is_ok());
        assert_eq!(world.entity_count(), 0);
        assert!(!world.detach::<Position>(Entity::from_raw(77)));
    }

    #[test]
    fn invalid_bundle_is_rejected() {
        // Given
        let world = World::new();
        let entity = world.spawn(Position { x: 1 });

        // When
        let spawned = world.try_spawn(Twice {
            first: Position { x: 1 },
            second: Position { x: 2 },
        });
        let attached = world.attach(
            entity,
            Twice {
                first: Position { x: 3 },
                second: Position { x: 4 },
            },
        );

        // Then
        assert!(matches!(spawned, Err(Error::DuplicateComponent { .. })));
        assert!(matches!(attached, Err(Error::DuplicateComponent { .. })));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.get::<Position>(entity), Some(Position { x: 1 }));
    }

    #[test]
    #[should_panic(expected = "Cannot spawn entity")]
    fn spawn_panics_on_invalid_bundle() {
        // Given
        let world = World::new();

        // Then
        world.spawn(Twice {
            first: Position { x: 1 },
            second: Position { x: 2 },
        });
    }

    #[test]
    fn asset_overwrite_reaches_systems() {
        // Given
        let world = World::new();
        world.asset(Config { level: 1 });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        world.system(move |config: Res<Config>| sink.lock().unwrap().push(config.level));
        world.step().unwrap();

        // When
        world.asset(Config { level: 2 });
        world.step().unwrap();

        // Then
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(world.get_asset::<Config>().unwrap().level, 2);
    }

    #[test]
    fn validate_checks_assets_before_stepping() {
        // Given
        let world = World::new();
        world.init_system(|_config: Res<Config>| {});

        // Then
        assert!(matches!(world.validate(), Err(Error::MissingAsset { .. })));

        // When
        world.asset(Config { level: 1 });

        // Then
        assert!(world.validate().is_ok());
    }

    #[test]
    fn systems_reach_their_world_through_handle() {
        // Given
        let world = Arc::new(World::new());
        world.asset(Handle::new(&world));
        world.init_system(|handle: Res<Handle>| {
            if let Some(world) = handle.upgrade() {
                world.spawn(Position { x: 42 });
                world.system(|| {});
            }
        });

        // When
        world.step().unwrap();

        // Then
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.pending_count(), 1);
        assert_eq!(world.system_count(), 0);
        assert!(world.get_asset::<Handle>().is_some());
    }

    #[test]
    fn validate_and_step_make_progress_concurrently() {
        // Given
        let world = Arc::new(World::new());
        world.asset(Config { level: 1 });
        world.system(|_config: Res<Config>| {});
        let (done, finished) = mpsc::channel();

        // When - One thread steps while another validates and registers
        let stepper = {
            let world = Arc::clone(&world);
            let done = done.clone();
            thread::spawn(move || {
                for _ in 0..2_000 {
                    world.step().unwrap();
                }
                done.send("step").unwrap();
            })
        };
        let validator = {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                for round in 0..2_000 {
                    world.validate().unwrap();
                    if round % 100 == 0 {
                        world.system(|| {});
                    }
                }
                done.send("validate").unwrap();
            })
        };

        // Then
        for _ in 0..2 {
            assert!(
                finished.recv_timeout(Duration::from_secs(30)).is_ok(),
                "step and validate stopped making progress"
            );
        }
        stepper.join().unwrap();
        validator.join().unwrap();
    }
}
