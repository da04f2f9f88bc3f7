//! # Evo Swarm - Evolutionary Multi-Agent Simulation
//!
//! Populations of herbivores, carnivores and scavengers live on a shared grid.
//! Every decision they take comes from small feed-forward networks, and the
//! networks' weights are evolved from one generation to the next by a genetic
//! algorithm. Non-evolving RTS workers gather gold on the same grid.
//!
//! ## Features
//!
//! - Feed-forward neural network brains (sigmoid layers)
//! - Genetic algorithm evolution (elitism, roulette, multi-point crossover, mutation)
//! - Sparse-set entity-component store with parallel systems
//! - Per-agent finite-state machines with deferred transitions
//! - Parallel sensing and behaviour passes with serial event application
//! - Boid flocking for scavengers
//! - Weight dumps to JSON
//!
//! ## Core Modules
//!
//! - [`simulation::population`] - Tick loop and epoch orchestration
//! - [`simulation::agent`] - Neural species and their behaviours
//! - [`simulation::brain`] - Neural network implementation
//! - [`simulation::genetic`] - Genetic algorithm
//! - [`simulation::ecs`] - Entity-component store and systems
//! - [`simulation::fsm`] - Finite-state machine framework
//! - [`simulation::events`] - Event system for thread-safe updates

/// Core simulation logic and data structures.
pub mod simulation {
    /// Neural species: bodies, senses and per-state behaviours.
    pub mod agent;
    /// Neural network implementation for agent brains.
    pub mod brain;
    /// Component kinds stored in the entity-component store.
    pub mod components;
    /// Entity-component store and system registry.
    pub mod ecs;
    /// Read-only world view shared by behaviours.
    pub mod environment;
    /// Error type and result alias.
    pub mod error;
    /// Event system for thread-safe state updates.
    pub mod events;
    /// Per-brain fitness and modifiers.
    pub mod fitness;
    /// Boid steering offsets.
    pub mod flocking;
    /// Generic finite-state machine.
    pub mod fsm;
    /// Genetic algorithm over flat genomes.
    pub mod genetic;
    /// Flat weight genomes.
    pub mod genome;
    /// Geometric utility functions for 2D vectors.
    pub mod geometric_utils;
    /// Shared spatial grid.
    pub mod grid;
    /// Simulation parameters.
    pub mod params;
    /// Weight persistence.
    pub mod persistence;
    /// Generation loop and epoch orchestration.
    pub mod population;
    /// KD-tree spatial index for sensing.
    pub mod spatial;
    /// Concrete ECS systems.
    pub mod systems;
    /// Non-evolving RTS gatherers.
    pub mod worker;
}
