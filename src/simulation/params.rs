//! Simulation parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Result, SimError};
use super::persistence::GenerationSelector;

/// Simulation parameters that control population, evolution and behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Number of grid columns.
    pub grid_width: usize,
    /// Number of grid rows.
    pub grid_height: usize,
    /// Target herbivore population.
    pub herbivore_count: usize,
    /// Target carnivore population.
    pub carnivore_count: usize,
    /// Target scavenger population.
    pub scavenger_count: usize,
    /// Number of RTS workers (not evolved).
    pub worker_count: usize,
    /// Plants seeded at every generation start.
    pub plant_count: usize,
    /// Food units per plant.
    pub plant_food: u32,
    /// Gold mines placed at startup.
    pub mine_count: usize,
    /// Gold per mine.
    pub mine_gold: u32,
    /// Generation length in simulated seconds.
    pub generation_duration: f32,
    /// Genomes copied unchanged into the next generation.
    pub elite_count: usize,
    /// Probability that any single weight mutates.
    pub mutation_chance: f32,
    /// Maximum jitter applied to a mutated weight.
    pub mutation_rate: f32,
    /// Crossover cut points.
    pub crossover_points: usize,
    /// Hidden layer widths shared by every brain.
    pub hidden_layers: Vec<usize>,
    /// Neuron bias.
    pub bias: f32,
    /// Sigmoid slope.
    pub sigmoid_p: f32,
    /// Herbivore starting hit points.
    pub herbivore_hp: i32,
    /// Hit points removed by one carnivore strike.
    pub attack_damage: i32,
    /// Attack brain output above which a carnivore strikes.
    pub attack_threshold: f32,
    /// Eat brain output above which an agent eats.
    pub eat_threshold: f32,
    /// Movement outputs within this distance of 0.5 do not move.
    pub move_dead_zone: f32,
    /// Cells within which a herbivore notices a carnivore.
    pub escape_radius: f32,
    /// Cells within which a carnivore can strike.
    pub attack_radius: f32,
    /// Food at which an agent is full.
    pub max_food: u32,
    /// Minimum food an agent needs to survive the epoch.
    pub food_to_survive: u32,
    /// Scavenger neighbour radius.
    pub flock_radius: f32,
    /// Scavenger speed in cells per second.
    pub scavenger_speed: f32,
    /// Maximum scavenger turn in radians per second.
    pub scavenger_turn_rate: f32,
    /// Distance at which a scavenger can eat a corpse.
    pub eat_radius: f32,
    /// Gold a worker carries before delivering.
    pub worker_capacity: u32,
    /// Multiplier applied to a brain's fitness modifier on reward.
    pub fitness_growth: f32,
    /// Multiplier applied to a brain's fitness modifier on punishment.
    pub fitness_decay: f32,
    /// Agents per parallel FSM batch.
    pub batch_size: usize,
    /// Worker threads (capped at 32).
    pub max_threads: usize,
    /// Whether weights are written to disk.
    pub save_weights: bool,
    /// Save every N generations.
    pub save_every: u32,
    /// Directory for weight files.
    pub weights_dir: String,
    /// Generation to load weights from at startup.
    pub load_generation: Option<GenerationSelector>,
    /// Request an epoch as soon as a species has no living member.
    pub epoch_on_collapse: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            grid_width: 64,
            grid_height: 64,
            herbivore_count: 30,
            carnivore_count: 10,
            scavenger_count: 10,
            worker_count: 4,
            plant_count: 120,
            plant_food: 3,
            mine_count: 6,
            mine_gold: 20,
            generation_duration: 20.0,
            elite_count: 4,
            mutation_chance: 0.1,
            mutation_rate: 0.1,
            crossover_points: 1,
            hidden_layers: vec![6],
            bias: 1.0,
            sigmoid_p: 0.5,
            herbivore_hp: 2,
            attack_damage: 1,
            attack_threshold: 0.6,
            eat_threshold: 0.5,
            move_dead_zone: 0.1,
            escape_radius: 4.0,
            attack_radius: 1.5,
            max_food: 5,
            food_to_survive: 1,
            flock_radius: 6.0,
            scavenger_speed: 2.0,
            scavenger_turn_rate: std::f32::consts::PI,
            eat_radius: 1.0,
            worker_capacity: 5,
            fitness_growth: 1.1,
            fitness_decay: 0.9,
            batch_size: 32,
            max_threads: 32,
            save_weights: false,
            save_every: 10,
            weights_dir: "weights".to_string(),
            load_generation: None,
            epoch_on_collapse: false,
        }
    }
}

impl Params {
    /// Loads parameters from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Params = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SimError::Config("grid must have at least one cell".into()));
        }
        if self.generation_duration <= 0.0 || !self.generation_duration.is_finite() {
            return Err(SimError::Config(format!(
                "generation_duration must be positive, got {}",
                self.generation_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(SimError::Config(format!(
                "mutation_chance must be within [0, 1], got {}",
                self.mutation_chance
            )));
        }
        if !(self.mutation_rate >= 0.0 && self.mutation_rate.is_finite()) {
            return Err(SimError::Config(format!(
                "mutation_rate must be finite and not negative, got {}",
                self.mutation_rate
            )));
        }
        if self.hidden_layers.contains(&0) {
            return Err(SimError::Config("hidden layers must not be empty".into()));
        }
        if self.sigmoid_p <= 0.0 {
            return Err(SimError::Config("sigmoid_p must be positive".into()));
        }
        if self.batch_size == 0 || self.max_threads == 0 {
            return Err(SimError::Config(
                "batch_size and max_threads must be at least 1".into(),
            ));
        }
        if self.fitness_growth <= 0.0 || self.fitness_decay <= 0.0 {
            return Err(SimError::Config(
                "fitness modifiers must stay positive".into(),
            ));
        }
        if self.save_weights && self.save_every == 0 {
            return Err(SimError::Config("save_every must be at least 1".into()));
        }
        Ok(())
    }
}
