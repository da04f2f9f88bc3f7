//! Concrete ECS systems.

use rayon::prelude::*;
use tracing::warn;

use super::components::{
    InputComponent, NeuralNetComponent, OutputComponent, PathRequestComponent, PathResultComponent,
};
use super::ecs::{Entity, System, World};
use super::grid::GridPos;

/// Evaluates every brain of every entity that has inputs, outputs and a network.
#[derive(Debug, Default)]
pub struct NeuralNetSystem {
    entities: Vec<Entity>,
}

impl NeuralNetSystem {
    /// Creates the system.
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for NeuralNetSystem {
    fn name(&self) -> &'static str {
        "neural_net"
    }

    fn pre_execute(&mut self, world: &World) {
        self.entities =
            world.entities_with::<(NeuralNetComponent, InputComponent, OutputComponent)>();
    }

    fn execute(&mut self, world: &World) {
        let (Some(nets), Some(inputs)) = (
            world.components::<NeuralNetComponent>(),
            world.components::<InputComponent>(),
        ) else {
            return;
        };

        // Read-only fan-out; results are written back under one write lock.
        let results: Vec<(Entity, Vec<Vec<f32>>)> = self
            .entities
            .par_iter()
            .filter_map(|&entity| {
                let net = nets.get(entity)?;
                let input = inputs.get(entity)?;
                let outputs = net
                    .brains
                    .iter()
                    .enumerate()
                    .map(|(slot, brain)| {
                        let vector = input.inputs.get(slot).map_or(&[][..], Vec::as_slice);
                        match brain.think(vector) {
                            Ok(out) => out.to_vec(),
                            Err(e) => {
                                warn!(
                                    entity,
                                    brain = ?brain.brain_type,
                                    error = %e,
                                    "brain evaluation failed"
                                );
                                vec![0.0; brain.outputs_count()]
                            }
                        }
                    })
                    .collect();
                Some((entity, outputs))
            })
            .collect();
        drop(inputs);
        drop(nets);

        let Some(mut outputs) = world.components_mut::<OutputComponent>() else {
            return;
        };
        for (entity, vectors) in results {
            if let Some(out) = outputs.get_mut(entity) {
                out.outputs = vectors;
            }
        }
    }
}

/// Resolves pending path requests with 4-connected stepping.
#[derive(Debug, Default)]
pub struct PathSystem {
    entities: Vec<Entity>,
}

impl PathSystem {
    /// Creates the system.
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for PathSystem {
    fn name(&self) -> &'static str {
        "path"
    }

    fn pre_execute(&mut self, world: &World) {
        self.entities = world.entities_with::<(PathRequestComponent, PathResultComponent)>();
    }

    fn execute(&mut self, world: &World) {
        if self.entities.is_empty() {
            return;
        }
        let (Some(mut requests), Some(mut results)) = (
            world.components_mut::<PathRequestComponent>(),
            world.components_mut::<PathResultComponent>(),
        ) else {
            return;
        };

        let solved: Vec<(Entity, Vec<GridPos>)> = requests
            .par_iter_mut()
            .filter(|(_, request)| request.pending)
            .map(|(entity, request)| {
                request.pending = false;
                (entity, step_path(request.from, request.to))
            })
            .collect();

        for (entity, path) in solved {
            if let Some(result) = results.get_mut(entity) {
                result.path = path;
                result.ready = true;
            }
        }
    }
}

/// Walks horizontally, then vertically, from `from` to `to`.
///
/// The start cell is not included; the goal is the last element.
pub fn step_path(from: GridPos, to: GridPos) -> Vec<GridPos> {
    let mut path = Vec::with_capacity(from.manhattan(to) as usize);
    let mut cursor = from;
    while cursor.x != to.x {
        cursor.x += (to.x - cursor.x).signum();
        path.push(cursor);
    }
    while cursor.y != to.y {
        cursor.y += (to.y - cursor.y).signum();
        path.push(cursor);
    }
    path
}
