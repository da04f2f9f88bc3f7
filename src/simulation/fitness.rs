//! Per-brain fitness bookkeeping.
//!
//! Every brain has a running fitness and a multiplicative modifier. Rewards
//! add `amount * modifier` and grow the modifier; punishments shrink it. The
//! modifier is clamped so it never reaches zero.

use serde::{Deserialize, Serialize};

/// Smallest modifier a brain can reach.
pub const MIN_MODIFIER: f32 = 0.01;
/// Largest modifier a brain can reach.
pub const MAX_MODIFIER: f32 = 10.0;

/// Fitness and modifier per brain slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessLedger {
    fitness: Vec<f32>,
    modifiers: Vec<f32>,
}

impl FitnessLedger {
    /// Creates a ledger for `brains` slots with fitness 0 and modifier 1.
    pub fn new(brains: usize) -> Self {
        Self {
            fitness: vec![0.0; brains],
            modifiers: vec![1.0; brains],
        }
    }

    /// Rewards slot `brain` and grows its modifier by `growth`.
    pub fn reward(&mut self, brain: usize, amount: f32, growth: f32) {
        if let (Some(f), Some(m)) = (self.fitness.get_mut(brain), self.modifiers.get_mut(brain)) {
            *f += amount * *m;
            *m = (*m * growth).clamp(MIN_MODIFIER, MAX_MODIFIER);
        }
    }

    /// Shrinks slot `brain`'s modifier by `decay`.
    pub fn punish(&mut self, brain: usize, decay: f32) {
        if let Some(m) = self.modifiers.get_mut(brain) {
            *m = (*m * decay).clamp(MIN_MODIFIER, MAX_MODIFIER);
        }
    }

    /// Resets every slot to fitness 0 and modifier 1.
    pub fn reset(&mut self) {
        self.fitness.iter_mut().for_each(|f| *f = 0.0);
        self.modifiers.iter_mut().for_each(|m| *m = 1.0);
    }

    /// Fitness of slot `brain` (0 for unknown slots).
    pub fn fitness(&self, brain: usize) -> f32 {
        self.fitness.get(brain).copied().unwrap_or(0.0)
    }

    /// Modifier of slot `brain` (1 for unknown slots).
    pub fn modifier(&self, brain: usize) -> f32 {
        self.modifiers.get(brain).copied().unwrap_or(1.0)
    }

    /// All fitness values.
    pub fn fitness_values(&self) -> &[f32] {
        &self.fitness
    }

    /// All modifiers.
    pub fn modifiers(&self) -> &[f32] {
        &self.modifiers
    }
}
