//! Systems and the registry that drives them once per tick.

use tracing::debug;

use super::World;

/// A unit of per-tick work over the store.
///
/// `execute` is expected to fan out over its entities internally (rayon).
/// Phases only get `&World`: component values may change through the
/// per-kind locks, but the entity set may not.
pub trait System: Send {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Runs once before the first tick.
    fn initialize(&mut self, _world: &mut World) {}

    /// Runs before any system's `execute` in the same tick.
    fn pre_execute(&mut self, _world: &World) {}

    /// Main per-tick work.
    fn execute(&mut self, world: &World);

    /// Runs after every system's `execute` in the same tick.
    fn post_execute(&mut self, _world: &World) {}
}

/// Ordered collection of registered systems.
#[derive(Default)]
pub struct Systems {
    systems: Vec<Box<dyn System>>,
    initialized: usize,
}

impl Systems {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system; systems run in registration order.
    pub fn register(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no system is registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Calls `initialize` on every system that has not been initialized yet.
    pub fn initialize(&mut self, world: &mut World) {
        for system in &mut self.systems[self.initialized..] {
            debug!(system = system.name(), "initializing system");
            system.initialize(world);
        }
        self.initialized = self.systems.len();
    }

    /// Runs one tick: every `pre_execute`, then every `execute`, then every `post_execute`.
    pub fn run(&mut self, world: &World) {
        for system in &mut self.systems {
            system.pre_execute(world);
        }
        for system in &mut self.systems {
            system.execute(world);
        }
        for system in &mut self.systems {
            system.post_execute(world);
        }
    }
}
