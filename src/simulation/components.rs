//! Component kinds stored in the [`World`](super::ecs::World).

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::brain::{Brain, BrainType};
use super::fitness::FitnessLedger;
use super::grid::GridPos;

/// Input vector per brain, filled during sensing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputComponent {
    /// One vector per brain, in brain order.
    pub inputs: Vec<Vec<f32>>,
}

/// Output vector per brain, filled by the neural net system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputComponent {
    /// One vector per brain, in brain order.
    pub outputs: Vec<Vec<f32>>,
}

/// An agent's brains and their fitness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetComponent {
    /// Brains in slot order.
    pub brains: Vec<Brain>,
    /// Fitness and modifier per brain slot.
    pub fitness: FitnessLedger,
}

impl NeuralNetComponent {
    /// Wraps `brains` with a fresh fitness ledger.
    pub fn new(brains: Vec<Brain>) -> Self {
        let fitness = FitnessLedger::new(brains.len());
        Self { brains, fitness }
    }

    /// Slot of the brain with type `brain_type`.
    pub fn slot(&self, brain_type: BrainType) -> Option<usize> {
        self.brains.iter().position(|b| b.brain_type == brain_type)
    }
}

/// Position and heading.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Position in grid units.
    pub position: Array1<f32>,
    /// Unit heading.
    pub forward: Array1<f32>,
}

/// Base flocking settings for a boid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoidConfigComponent {
    /// Neighbour radius.
    pub radius: f32,
    /// Scale of the alignment offset.
    pub alignment: f32,
    /// Scale of the cohesion offset.
    pub cohesion: f32,
    /// Scale of the separation offset.
    pub separation: f32,
    /// Scale of the direction-to-target offset.
    pub direction: f32,
}

impl Default for BoidConfigComponent {
    fn default() -> Self {
        Self {
            radius: 6.0,
            alignment: 1.0,
            cohesion: 1.0,
            separation: 1.5,
            direction: 1.0,
        }
    }
}

/// A pending request for a path between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRequestComponent {
    /// Start cell.
    pub from: GridPos,
    /// Goal cell.
    pub to: GridPos,
    /// Whether the request still waits for the path system.
    pub pending: bool,
}

/// Path produced for the last request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResultComponent {
    /// Cells to visit after the start cell, goal last.
    pub path: Vec<GridPos>,
    /// Whether `path` holds a result not yet handed to the agent.
    pub ready: bool,
}
