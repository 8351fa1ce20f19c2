//! Dependency tracking between mutable data and the caches computed from it.
//!
//! A [`Closure`] maps dependency keys to the set of [`Cache`]s that read them (a [`Graph`]).
//! Resetting a key resets every cache in its graph. A reverse index from each cache to its keys
//! lets a cache be unlinked from everything in time proportional to its own links rather than to
//! the number of keys.
//!
//! Resetting does not remove links: a reset cache stays subscribed to the key, and is typically
//! relinked (see [`Closure::relink`]) the next time its body recomputes and learns what it reads.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use log::trace;

use crate::ecs::{asset, cache::Cache, component, entity::Entity};

/// The identities the world invalidates caches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A single entity's record.
    Entity(Entity),

    /// The set of entities carrying a component type. Reset when an entity gains the type.
    Component(component::Id),

    /// A singleton asset.
    Asset(asset::Key),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Entity(entity) => write!(f, "{entity}"),
            Key::Component(id) => write!(f, "Component({})", id.index()),
            Key::Asset(key) => write!(f, "Asset({})", key.name()),
        }
    }
}

/// A cache compared and hashed by identity.
#[derive(Clone)]
struct Dependent(Arc<Cache>);

impl PartialEq for Dependent {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Dependent {}

impl Hash for Dependent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

/// The set of caches depending on one key.
#[derive(Default)]
pub struct Graph {
    dependents: HashSet<Dependent>,
}

impl Graph {
    /// Reset every cache in the graph.
    pub fn reset(&self) {
        for dependent in &self.dependents {
            dependent.0.reset();
        }
    }

    /// The number of caches in the graph.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    /// Whether the graph holds no caches.
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    fn add(&mut self, cache: &Arc<Cache>) {
        self.dependents.insert(Dependent(Arc::clone(cache)));
    }

    fn remove(&mut self, cache: &Arc<Cache>) {
        self.dependents.remove(&Dependent(Arc::clone(cache)));
    }
}

/// A forest of dependency graphs, one per key.
///
/// Every operation is total: keys and caches that were never linked behave as empty.
pub struct Closure<K = Key> {
    forest: HashMap<K, Graph>,
    index: HashMap<Dependent, HashSet<K>>,
}

impl<K> Default for Closure<K> {
    fn default() -> Self {
        Self {
            forest: HashMap::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq + Clone + fmt::Debug> Closure<K> {
    /// Create an empty closure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `cache` depend on `key`. Idempotent.
    pub fn link(&mut self, key: K, cache: &Arc<Cache>) {
        self.forest.entry(key.clone()).or_default().add(cache);
        self.index
            .entry(Dependent(Arc::clone(cache)))
            .or_default()
            .insert(key);
    }

    /// Remove the dependency of `cache` on `key`. Idempotent.
    pub fn unlink(&mut self, key: &K, cache: &Arc<Cache>) {
        let dependent = Dependent(Arc::clone(cache));
        self.detach(key, &dependent);
        if let Some(keys) = self.index.get_mut(&dependent) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&dependent);
            }
        }
    }

    /// Remove `cache` from every graph it is linked into.
    pub fn forget(&mut self, cache: &Arc<Cache>) {
        let dependent = Dependent(Arc::clone(cache));
        if let Some(keys) = self.index.remove(&dependent) {
            for key in &keys {
                self.detach(key, &dependent);
            }
        }
    }

    /// Replace every link of `cache` with links to `keys`.
    pub fn relink(&mut self, cache: &Arc<Cache>, keys: impl IntoIterator<Item = K>) {
        self.forget(cache);
        for key in keys {
            self.link(key, cache);
        }
    }

    /// Drop `key`'s whole graph without resetting its members.
    pub fn flush(&mut self, key: &K) {
        if let Some(graph) = self.forest.remove(key) {
            for dependent in graph.dependents {
                if let Some(keys) = self.index.get_mut(&dependent) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.index.remove(&dependent);
                    }
                }
            }
        }
    }

    /// Reset every cache linked to `key`. Links are kept.
    ///
    /// Resetting waits for any in-flight computation of each cache. Callers that share the closure
    /// behind a lock should collect [`dependents`](Self::dependents) and reset them after releasing
    /// it instead.
    pub fn reset(&self, key: &K) {
        if let Some(graph) = self.forest.get(key) {
            trace!("Resetting {} dependents of {key:?}", graph.len());
            graph.reset();
        }
    }

    /// The caches currently linked to `key`.
    pub fn dependents(&self, key: &K) -> Vec<Arc<Cache>> {
        self.forest
            .get(key)
            .map(|graph| {
                graph
                    .dependents
                    .iter()
                    .map(|dependent| Arc::clone(&dependent.0))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The graph for `key`, if any cache is linked to it.
    pub fn graph(&self, key: &K) -> Option<&Graph> {
        self.forest.get(key)
    }

    /// The number of keys `cache` is linked to.
    pub fn links(&self, cache: &Arc<Cache>) -> usize {
        self.index
            .get(&Dependent(Arc::clone(cache)))
            .map_or(0, HashSet::len)
    }

    /// The number of keys with at least one dependent.
    pub fn len(&self) -> usize {
        self.forest.len()
    }

    /// Whether no key has dependents.
    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Remove `dependent` from `key`'s graph, dropping the graph once empty.
    fn detach(&mut self, key: &K, dependent: &Dependent) {
        if let Some(graph) = self.forest.get_mut(key) {
            graph.dependents.remove(dependent);
            if graph.is_empty() {
                self.forest.remove(key);
            }
        }
    }
}
