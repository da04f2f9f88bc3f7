//! Flat weight vectors, the unit of evolution.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A flat weight vector with the fitness its owner earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Network weights in [`Brain::weights`](super::brain::Brain::weights) order.
    pub weights: Vec<f32>,
    /// Fitness accumulated by the brain these weights came from.
    pub fitness: f32,
}

impl Genome {
    /// Creates a genome of `len` weights drawn uniformly from `[-1, 1]`.
    pub fn new_random(len: usize) -> Self {
        Self::new_random_with(&mut rand::rng(), len)
    }

    /// Same as [`Genome::new_random`] with an explicit generator.
    pub fn new_random_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        Self {
            weights: (0..len).map(|_| rng.random_range(-1.0..=1.0)).collect(),
            fitness: 0.0,
        }
    }

    /// Wraps existing weights, e.g. ones extracted from a live network.
    pub fn from_weights(weights: Vec<f32>, fitness: f32) -> Self {
        Self { weights, fitness }
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether the genome has no weights.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
