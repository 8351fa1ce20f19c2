use fixedbitset::FixedBitSet;

use crate::ecs::component;

/// A per-component-type index of the record slots carrying that component.
///
/// Each component id owns a bitset where bit N set means the record in slot N has the component.
/// Slots are dense and reused once their record is deleted, so a bitset is only ever as long as the
/// most records live at once. Matching several components is a bitwise intersection.
#[derive(Debug, Default)]
pub struct TypeIndex {
    /// Bitsets of record slots, indexed by component id.
    sets: Vec<FixedBitSet>,
}

impl TypeIndex {
    /// Create an empty index.
    #[inline]
    pub const fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Record that the record in `slot` carries `component`.
    pub fn insert(&mut self, component: component::Id, slot: usize) {
        let index = component.index();
        if index >= self.sets.len() {
            self.sets.resize_with(index + 1, FixedBitSet::new);
        }
        let set = &mut self.sets[index];
        if slot >= set.len() {
            set.grow(slot + 1);
        }
        set.insert(slot);
    }

    /// Record that the record in `slot` no longer carries `component`.
    pub fn remove(&mut self, component: component::Id, slot: usize) {
        if let Some(set) = self.sets.get_mut(component.index()) {
            if slot < set.len() {
                set.set(slot, false);
            }
        }
    }

    /// The slots carrying every one of `components`.
    ///
    /// Stops intersecting as soon as the running result is empty. An empty `components` slice
    /// matches nothing; callers decide what "no constraint" means.
    pub fn matching(&self, components: &[component::Id]) -> FixedBitSet {
        let Some((first, rest)) = components.split_first() else {
            return FixedBitSet::new();
        };
        let Some(mut matched) = self.sets.get(first.index()).cloned() else {
            return FixedBitSet::new();
        };
        for component in rest {
            if matched.is_clear() {
                break;
            }
            match self.sets.get(component.index()) {
                Some(set) => matched.intersect_with(set),
                None => return FixedBitSet::new(),
            }
        }
        matched
    }
}
