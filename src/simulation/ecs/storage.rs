//! Dense per-kind component storage.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use rayon::prelude::*;

use super::{Component, Entity};

/// Sparse set holding every component of one kind.
///
/// Components live contiguously in `dense`; `owners[i]` is the entity that owns
/// `dense[i]` and `sparse` maps an entity back to its slot.
#[derive(Debug)]
pub struct ComponentStorage<T> {
    dense: Vec<T>,
    owners: Vec<Entity>,
    sparse: HashMap<Entity, usize>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            dense: Vec::new(),
            owners: Vec::new(),
            sparse: HashMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Inserts or replaces the component owned by `entity`.
    ///
    /// Returns `true` when the entity did not have this kind before.
    pub fn insert(&mut self, entity: Entity, component: T) -> bool {
        if let Some(&slot) = self.sparse.get(&entity) {
            self.dense[slot] = component;
            false
        } else {
            self.sparse.insert(entity, self.dense.len());
            self.dense.push(component);
            self.owners.push(entity);
            true
        }
    }

    /// Removes and returns the component owned by `entity`.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.sparse.remove(&entity)?;
        let last = self.dense.len() - 1;
        if slot != last {
            let moved = self.owners[last];
            self.sparse.insert(moved, slot);
        }
        self.owners.swap_remove(slot);
        Some(self.dense.swap_remove(slot))
    }

    /// Whether `entity` owns a component of this kind.
    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains_key(&entity)
    }

    /// Borrows the component owned by `entity`.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.sparse.get(&entity).map(|&slot| &self.dense[slot])
    }

    /// Mutably borrows the component owned by `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.sparse.get(&entity).map(|&slot| &mut self.dense[slot])
    }

    pub(super) fn slot(&self, entity: Entity) -> Option<usize> {
        self.sparse.get(&entity).copied()
    }

    pub(super) fn at(&self, slot: usize) -> &T {
        &self.dense[slot]
    }

    pub(super) fn at_mut(&mut self, slot: usize) -> &mut T {
        &mut self.dense[slot]
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether no component of this kind exists.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Entities owning a component of this kind, in storage order.
    pub fn entities(&self) -> &[Entity] {
        &self.owners
    }

    /// Iterates `(entity, component)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(entity, component)` pairs mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }

    /// Parallel mutable iteration for systems.
    pub fn par_iter_mut(&mut self) -> impl ParallelIterator<Item = (Entity, &mut T)> {
        self.owners.par_iter().copied().zip(self.dense.par_iter_mut())
    }
}

/// Type-erased view of a locked storage, used for structural operations.
pub(super) trait ErasedStorage: Send + Sync {
    fn remove_entity(&mut self, entity: Entity);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStorage for RwLock<ComponentStorage<T>> {
    fn remove_entity(&mut self, entity: Entity) {
        self.get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
