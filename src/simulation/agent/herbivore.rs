//! Herbivore behaviours: walk to plants, eat them, run from carnivores.

use super::{AgentFlag, AgentMachine, AgentState, Body, Inert};
use crate::simulation::brain::BrainType;
use crate::simulation::environment::Environment;
use crate::simulation::events::SimEvent;
use crate::simulation::fsm::{FsmBlueprint, StateBehaviour, TickOutput};
use crate::simulation::grid::{GridPos, NodeTerrain};

const APPROACH_REWARD: f32 = 0.1;
const REACH_REWARD: f32 = 1.0;
const ESCAPE_REWARD: f32 = 0.5;

/// Builds the herbivore transition table.
pub fn blueprint() -> FsmBlueprint<AgentMachine> {
    let mut bp = FsmBlueprint::new();
    bp.set_transition(AgentState::Walk, AgentFlag::OnTargetReach, AgentState::Eat)
        .set_transition(AgentState::Walk, AgentFlag::OnEscape, AgentState::Escape)
        .set_transition(AgentState::Eat, AgentFlag::OnFull, AgentState::Walk)
        .set_transition(AgentState::Eat, AgentFlag::OnTargetLost, AgentState::Walk)
        .set_transition(AgentState::Eat, AgentFlag::OnEscape, AgentState::Escape)
        .set_transition(AgentState::Escape, AgentFlag::OnSafe, AgentState::Walk);
    for state in [AgentState::Walk, AgentState::Eat, AgentState::Escape] {
        bp.set_transition(state, AgentFlag::OnDeath, AgentState::Dead);
    }
    bp.add_behaviour(AgentState::Walk, Walk)
        .add_behaviour(AgentState::Eat, Eat)
        .add_behaviour(AgentState::Escape, Escape)
        .add_behaviour(AgentState::Dead, Inert);
    bp
}

fn threatened(body: &Body, world: &Environment) -> bool {
    body.senses
        .predator_distance(&body.position, world.grid.as_ref())
        .is_some_and(|d| d <= world.params.escape_radius)
}

/// Moves by the movement brain toward plants.
pub struct Walk;

impl StateBehaviour<AgentMachine> for Walk {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        if threatened(body, world) {
            out.trigger(AgentFlag::OnEscape);
        }

        let plant = body.senses.plant.clone();
        let before = plant.as_ref().map(|p| world.grid.distance(&body.position, p));
        let outputs = body.output(BrainType::Movement).to_vec();
        body.grid_step(&outputs, world, out);

        let (Some(plant), Some(before)) = (plant, before) else {
            return;
        };
        let after = world.grid.distance(&body.position, &plant);
        if after < before {
            body.reward(BrainType::Movement, APPROACH_REWARD, out);
        } else {
            body.punish(BrainType::Movement, out);
        }
        if body.cell() == GridPos::from_position(&plant) && body.food < world.params.max_food {
            body.reward(BrainType::Movement, REACH_REWARD, out);
            out.trigger(AgentFlag::OnTargetReach);
        }
    }
}

/// Eats the plant under the herbivore when the eat brain fires.
pub struct Eat;

impl StateBehaviour<AgentMachine> for Eat {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        if threatened(body, world) {
            out.trigger(AgentFlag::OnEscape);
            return;
        }
        if body.food >= world.params.max_food {
            out.trigger(AgentFlag::OnFull);
            return;
        }
        let cell = body.senses.cell;
        if cell.terrain != NodeTerrain::Plant || cell.food == 0 {
            out.trigger(AgentFlag::OnTargetLost);
            return;
        }

        let wants = body
            .output(BrainType::Eat)
            .first()
            .is_some_and(|&o| o > world.params.eat_threshold);
        if wants {
            out.emit(SimEvent::EatPlant {
                entity: body.entity,
                cell: body.cell(),
            });
        } else {
            body.punish(BrainType::Eat, out);
        }
    }
}

/// Moves by the escape brain away from the closest carnivore.
pub struct Escape;

impl StateBehaviour<AgentMachine> for Escape {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        let Some(predator) = body.senses.predator.as_ref().map(|p| p.position.clone()) else {
            out.trigger(AgentFlag::OnSafe);
            return;
        };
        let before = world.grid.distance(&body.position, &predator);
        let outputs = body.output(BrainType::Escape).to_vec();
        body.grid_step(&outputs, world, out);
        let after = world.grid.distance(&body.position, &predator);

        if after > before {
            body.reward(BrainType::Escape, ESCAPE_REWARD, out);
        } else {
            body.punish(BrainType::Escape, out);
        }
        if after > world.params.escape_radius {
            out.trigger(AgentFlag::OnSafe);
        }
    }
}
