//! Sensing and brain input vectors.

use ndarray::Array1;

use super::{AgentType, Body, Species};
use crate::simulation::brain::BrainType;
use crate::simulation::components::BoidConfigComponent;
use crate::simulation::ecs::Entity;
use crate::simulation::flocking::{Neighbour, steer};
use crate::simulation::geometric_utils::length;
use crate::simulation::grid::{GridWorld, Node, NodeTerrain};
use crate::simulation::params::Params;
use crate::simulation::spatial::{Sighting, SpatialIndex};

/// Another agent the body has noticed.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Entity of the other agent.
    pub entity: Entity,
    /// Its position when sensed.
    pub position: Array1<f32>,
}

impl Target {
    fn from_sighting(sighting: &Sighting) -> Option<Self> {
        Some(Self {
            entity: sighting.entity?,
            position: sighting.position.clone(),
        })
    }
}

/// What a body perceived during the last sensing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Senses {
    /// Closest plant with food.
    pub plant: Option<Array1<f32>>,
    /// Closest corpse with food.
    pub corpse: Option<Array1<f32>>,
    /// Closest living herbivore (carnivores only).
    pub prey: Option<Target>,
    /// Closest carnivore (herbivores only).
    pub predator: Option<Target>,
    /// Node under the body.
    pub cell: Node,
}

impl Senses {
    /// Wrapped distance from `from` to the predator, if one was sensed.
    pub fn predator_distance(&self, from: &Array1<f32>, grid: &dyn GridWorld) -> Option<f32> {
        self.predator.as_ref().map(|p| grid.distance(from, &p.position))
    }

    /// Wrapped distance from `from` to the prey, if one was sensed.
    pub fn prey_distance(&self, from: &Array1<f32>, grid: &dyn GridWorld) -> Option<f32> {
        self.prey.as_ref().map(|p| grid.distance(from, &p.position))
    }
}

/// Refreshes `body.senses` (and the boid of scavengers) from the index.
pub fn sense(
    body: &mut Body,
    index: &SpatialIndex,
    grid: &dyn GridWorld,
    boid_config: Option<&BoidConfigComponent>,
) {
    let me = Some(body.entity);
    let mut senses = Senses {
        cell: grid.node(body.cell()).copied().unwrap_or_default(),
        ..Senses::default()
    };

    match body.species.agent_type() {
        AgentType::Herbivore => {
            senses.plant = index.plants.nearest(&body.position, None).map(|s| s.position.clone());
            senses.predator = index
                .carnivores
                .nearest(&body.position, me)
                .and_then(Target::from_sighting);
        }
        AgentType::Carnivore => {
            senses.prey = index
                .herbivores
                .nearest(&body.position, me)
                .and_then(Target::from_sighting);
            senses.corpse = index.corpses.nearest(&body.position, None).map(|s| s.position.clone());
        }
        AgentType::Scavenger => {
            senses.corpse = index.corpses.nearest(&body.position, None).map(|s| s.position.clone());
        }
    }

    if let (Species::Scavenger(scavenger), Some(config)) = (&mut body.species, boid_config) {
        let neighbours: Vec<Neighbour> = index
            .scavengers
            .within(&body.position, config.radius, me)
            .into_iter()
            // Neighbours across an edge are seen at their nearest copy.
            .map(|s| Neighbour {
                position: &body.position + &grid.offset(&body.position, &s.position),
                forward: s.forward.clone(),
            })
            .collect();
        let corpse = senses
            .corpse
            .as_ref()
            .map(|c| &body.position + &grid.offset(&body.position, c));
        let (stats, offsets) = steer(
            &body.position,
            &body.forward,
            &neighbours,
            corpse.as_ref(),
            config,
        );
        scavenger.boid.stats = stats;
        scavenger.boid.offsets = offsets;
    }

    body.senses = senses;
}

/// Builds one input vector per brain slot from the body's last senses.
pub fn inputs(body: &Body, grid: &dyn GridWorld, params: &Params) -> Vec<Vec<f32>> {
    let width = grid.width().max(1) as f32;
    let height = grid.height().max(1) as f32;
    let ratio = |num: f32, den: f32| if den > 0.0 { (num / den).clamp(0.0, 1.0) } else { 0.0 };
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let offset = |target: Option<&Array1<f32>>| {
        target.map_or([0.0, 0.0], |t| {
            let d = grid.offset(&body.position, t);
            [d[0] / width, d[1] / height]
        })
    };

    let x = body.position[0] / width;
    let y = body.position[1] / height;
    let food = ratio(body.food as f32, params.max_food as f32);
    let hp = match &body.species {
        Species::Herbivore(h) => ratio(h.hp as f32, params.herbivore_hp as f32),
        _ => 1.0,
    };
    let senses = &body.senses;

    body.brains
        .iter()
        .map(|&brain| match (body.species.agent_type(), brain) {
            (AgentType::Herbivore, BrainType::Movement) => {
                let [dx, dy] = offset(senses.plant.as_ref());
                vec![x, y, dx, dy, flag(senses.plant.is_some()), food]
            }
            (AgentType::Herbivore, BrainType::Eat) => {
                let on_plant = senses.cell.terrain == NodeTerrain::Plant && senses.cell.food > 0;
                vec![
                    flag(on_plant),
                    ratio(senses.cell.food as f32, params.plant_food as f32),
                    food,
                    hp,
                ]
            }
            (AgentType::Herbivore, BrainType::Escape) => {
                let [dx, dy] = offset(senses.predator.as_ref().map(|p| &p.position));
                let closeness = senses
                    .predator_distance(&body.position, grid)
                    .map_or(0.0, |d| 1.0 - ratio(d, params.escape_radius));
                vec![dx, dy, flag(senses.predator.is_some()), hp, closeness]
            }
            (AgentType::Carnivore, BrainType::Movement) => {
                let [dx, dy] = offset(senses.prey.as_ref().map(|p| &p.position));
                vec![x, y, dx, dy, flag(senses.prey.is_some()), food]
            }
            (AgentType::Carnivore, BrainType::Attack) => {
                let (dx, dy, in_range) = senses.prey.as_ref().map_or((0.0, 0.0, false), |p| {
                    let d = grid.offset(&body.position, &p.position);
                    let r = params.attack_radius.max(f32::EPSILON);
                    (
                        (d[0] / r).clamp(-1.0, 1.0),
                        (d[1] / r).clamp(-1.0, 1.0),
                        length(&d) <= params.attack_radius,
                    )
                });
                vec![dx, dy, flag(in_range), food]
            }
            (AgentType::Scavenger, BrainType::ScavengerMovement) => {
                let [dx, dy] = offset(senses.corpse.as_ref());
                vec![
                    x,
                    y,
                    dx,
                    dy,
                    flag(senses.corpse.is_some()),
                    body.forward[0],
                    body.forward[1],
                ]
            }
            (AgentType::Scavenger, BrainType::Flocking) => {
                let Species::Scavenger(scavenger) = &body.species else {
                    return vec![0.0; 6];
                };
                let stats = &scavenger.boid.stats;
                let radius = params.flock_radius.max(f32::EPSILON);
                vec![
                    ratio(stats.neighbours as f32, 10.0),
                    stats.average_heading[0],
                    stats.average_heading[1],
                    (stats.centroid_offset[0] / radius).clamp(-1.0, 1.0),
                    (stats.centroid_offset[1] / radius).clamp(-1.0, 1.0),
                    ratio(stats.nearest_distance, radius),
                ]
            }
            // A brain outside the species' set gets an empty vector and
            // fails its width check in the neural net system.
            _ => Vec::new(),
        })
        .collect()
}
