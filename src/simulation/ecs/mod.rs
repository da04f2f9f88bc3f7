//! Entity-component store.
//!
//! Entities are plain `u32` ids. Every component kind gets its own dense
//! [`ComponentStorage`] behind a `RwLock`, so systems can hold read guards on
//! some kinds and a write guard on another while iterating in parallel.
//! Structural changes (creating or removing entities, adding components) go
//! through `&mut World` and invalidate the query cache.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod storage;
pub mod system;

pub use storage::ComponentStorage;
pub use system::{System, Systems};

use storage::ErasedStorage;

/// Opaque entity identifier.
pub type Entity = u32;

/// Marker for types that can be stored as components.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Single tag flag attached to an entity (e.g. its agent type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

/// A set of component kinds that can be queried together.
pub trait ComponentSet {
    /// Type ids of every kind in the set, sorted.
    fn type_ids() -> Vec<TypeId>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                let mut ids = vec![$(TypeId::of::<$name>()),+];
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

/// Read guard onto a single component.
pub struct ComponentRef<'a, T: Component> {
    guard: RwLockReadGuard<'a, ComponentStorage<T>>,
    slot: usize,
}

impl<T: Component> Deref for ComponentRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard.at(self.slot)
    }
}

/// Write guard onto a single component.
pub struct ComponentMut<'a, T: Component> {
    guard: RwLockWriteGuard<'a, ComponentStorage<T>>,
    slot: usize,
}

impl<T: Component> Deref for ComponentMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard.at(self.slot)
    }
}

impl<T: Component> DerefMut for ComponentMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard.at_mut(self.slot)
    }
}

type CachedQuery = (u64, Vec<Entity>);

/// The entity-component store.
pub struct World {
    next_entity: Entity,
    entities: BTreeSet<Entity>,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
    membership: HashMap<TypeId, BTreeSet<Entity>>,
    tags: HashMap<Entity, Tag>,
    version: u64,
    query_cache: Mutex<HashMap<Vec<TypeId>, CachedQuery>>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            next_entity: 0,
            entities: BTreeSet::new(),
            storages: HashMap::new(),
            membership: HashMap::new(),
            tags: HashMap::new(),
            version: 0,
            query_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a fresh, never reused entity id.
    pub fn create_entity(&mut self) -> Entity {
        let id = self.next_entity;
        self.next_entity += 1;
        self.entities.insert(id);
        self.version += 1;
        id
    }

    /// Whether `entity` exists.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates live entity ids in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Attaches `component` to `entity`, replacing any prior component of that kind.
    ///
    /// Adding to an unknown entity is ignored and returns `false`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.entities.contains(&entity) {
            return false;
        }
        let added = self
            .storage_slot_mut::<T>()
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity, component);
        if added {
            self.membership
                .entry(TypeId::of::<T>())
                .or_default()
                .insert(entity);
            self.version += 1;
        }
        true
    }

    /// Detaches and returns the component of kind `T` owned by `entity`.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self
            .storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<RwLock<ComponentStorage<T>>>()?
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity);
        if removed.is_some() {
            if let Some(set) = self.membership.get_mut(&TypeId::of::<T>()) {
                set.remove(&entity);
            }
            self.version += 1;
        }
        removed
    }

    /// Whether `entity` owns a component of kind `T`.
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.membership
            .get(&TypeId::of::<T>())
            .is_some_and(|set| set.contains(&entity))
    }

    /// Read access to one component, or `None` if it does not exist.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<ComponentRef<'_, T>> {
        let guard = self.components::<T>()?;
        let slot = guard.slot(entity)?;
        Some(ComponentRef { guard, slot })
    }

    /// Write access to one existing component through a shared store.
    ///
    /// Only the component's value can change; the entity set stays the same.
    pub fn write_component<T: Component>(&self, entity: Entity) -> Option<ComponentMut<'_, T>> {
        let guard = self.components_mut::<T>()?;
        let slot = guard.slot(entity)?;
        Some(ComponentMut { guard, slot })
    }

    /// Mutable access to one component without locking.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<RwLock<ComponentStorage<T>>>()?
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(entity)
    }

    /// Read access to every component of kind `T`.
    pub fn components<T: Component>(&self) -> Option<RwLockReadGuard<'_, ComponentStorage<T>>> {
        Some(
            self.lock::<T>()?
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Write access to every component of kind `T`.
    pub fn components_mut<T: Component>(
        &self,
    ) -> Option<RwLockWriteGuard<'_, ComponentStorage<T>>> {
        Some(
            self.lock::<T>()?
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Entities that own every kind in `S`, in ascending id order.
    ///
    /// Results are cached until the next structural change.
    pub fn entities_with<S: ComponentSet>(&self) -> Vec<Entity> {
        let ids = S::type_ids();
        let mut cache = self
            .query_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((version, cached)) = cache.get(&ids) {
            if *version == self.version {
                return cached.clone();
            }
        }

        let result: Vec<Entity> = match ids.split_first() {
            None => self.entities.iter().copied().collect(),
            Some((first, rest)) => self
                .membership
                .get(first)
                .map(|set| {
                    set.iter()
                        .copied()
                        .filter(|e| {
                            rest.iter().all(|id| {
                                self.membership.get(id).is_some_and(|s| s.contains(e))
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };
        cache.insert(ids, (self.version, result.clone()));
        result
    }

    /// Sets the tag of `entity`, replacing any previous one.
    pub fn set_tag(&mut self, entity: Entity, tag: Tag) {
        if self.entities.contains(&entity) {
            self.tags.insert(entity, tag);
        }
    }

    /// Tag of `entity`, if any.
    pub fn tag(&self, entity: Entity) -> Option<Tag> {
        self.tags.get(&entity).copied()
    }

    /// Entities carrying `tag`, in ascending id order.
    pub fn entities_with_tag(&self, tag: Tag) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .tags
            .iter()
            .filter(|(_, t)| **t == tag)
            .map(|(e, _)| *e)
            .collect();
        found.sort_unstable();
        found
    }

    /// Removes `entity` together with every component and its tag.
    ///
    /// Returns `false` if the entity did not exist.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.remove(&entity) {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        for set in self.membership.values_mut() {
            set.remove(&entity);
        }
        self.tags.remove(&entity);
        self.version += 1;
        true
    }

    fn lock<T: Component>(&self) -> Option<&RwLock<ComponentStorage<T>>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<RwLock<ComponentStorage<T>>>()
    }

    fn storage_slot_mut<T: Component>(&mut self) -> &mut RwLock<ComponentStorage<T>> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(RwLock::new(ComponentStorage::<T>::default())))
            .as_any_mut()
            .downcast_mut::<RwLock<ComponentStorage<T>>>()
            .unwrap_or_else(|| unreachable!("storage registered under a foreign type id"))
    }
}
