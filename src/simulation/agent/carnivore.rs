//! Carnivore behaviours: hunt herbivores, strike them, eat corpses.

use ndarray::Array1;

use super::{AgentFlag, AgentMachine, AgentState, Body, CorpseEat, Inert, corpse_in_reach};
use crate::simulation::brain::BrainType;
use crate::simulation::environment::Environment;
use crate::simulation::events::SimEvent;
use crate::simulation::fsm::{FsmBlueprint, StateBehaviour, TickOutput};
use crate::simulation::geometric_utils::length;

const APPROACH_REWARD: f32 = 0.1;

/// Builds the carnivore transition table.
pub fn blueprint() -> FsmBlueprint<AgentMachine> {
    let mut bp = FsmBlueprint::new();
    bp.set_transition(AgentState::Walk, AgentFlag::OnPreyNear, AgentState::Attack)
        .set_transition(AgentState::Walk, AgentFlag::OnTargetReach, AgentState::Eat)
        .set_transition(AgentState::Attack, AgentFlag::OnTargetLost, AgentState::Walk)
        .set_transition(AgentState::Eat, AgentFlag::OnTargetLost, AgentState::Walk)
        .set_transition(AgentState::Eat, AgentFlag::OnFull, AgentState::Walk)
        .set_transition(AgentState::Eat, AgentFlag::OnPreyNear, AgentState::Attack);
    bp.add_behaviour(AgentState::Walk, Walk)
        .add_behaviour(AgentState::Attack, Attack)
        .add_behaviour(
            AgentState::Eat,
            CorpseEat {
                rewarded: BrainType::Movement,
            },
        )
        .add_behaviour(AgentState::Dead, Inert);
    bp
}

fn prey_in_range(body: &Body, world: &Environment) -> bool {
    body.senses
        .prey_distance(&body.position, world.grid.as_ref())
        .is_some_and(|d| d <= world.params.attack_radius)
}

/// Moves by the movement brain toward the closest herbivore.
pub struct Walk;

impl StateBehaviour<AgentMachine> for Walk {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        if body.food < world.params.max_food && corpse_in_reach(body, world) {
            out.trigger(AgentFlag::OnTargetReach);
            return;
        }

        let grid = world.grid.as_ref();
        let before = body.senses.prey_distance(&body.position, grid);
        let outputs = body.output(BrainType::Movement).to_vec();
        body.grid_step(&outputs, world, out);

        let Some(before) = before else {
            return;
        };
        let after = body.senses.prey_distance(&body.position, grid).unwrap_or(before);
        if after < before {
            body.reward(BrainType::Movement, APPROACH_REWARD, out);
        } else {
            body.punish(BrainType::Movement, out);
        }
        if prey_in_range(body, world) {
            out.trigger(AgentFlag::OnPreyNear);
        }
    }
}

/// Strikes the prey, then chases it.
///
/// Step 0 decides whether to strike (resolved on the coordinating thread),
/// step 1 closes in on the prey if it stepped out of range.
pub struct Attack;

impl StateBehaviour<AgentMachine> for Attack {
    fn steps(&self) -> usize {
        2
    }

    fn on_tick(
        &self,
        step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        let params = &world.params;
        let Some(prey) = body.senses.prey.clone() else {
            out.trigger(AgentFlag::OnTargetLost);
            return;
        };

        if step == 0 {
            let strike = body
                .output(BrainType::Attack)
                .first()
                .is_some_and(|&o| o > params.attack_threshold);
            let in_range = prey_in_range(body, world);
            match (strike, in_range) {
                (true, true) => out.emit(SimEvent::Strike {
                    attacker: body.entity,
                    target: prey.entity,
                    damage: params.attack_damage,
                }),
                // Swinging at nothing or hesitating in reach are both mistakes.
                (true, false) | (false, true) => body.punish(BrainType::Attack, out),
                (false, false) => {}
            }
            return;
        }

        let offset = world.grid.offset(&body.position, &prey.position);
        if length(&offset) > params.attack_radius {
            let toward = Array1::from_vec(vec![
                offset[0].signum() * f32::from(offset[0].abs() >= 0.5),
                offset[1].signum() * f32::from(offset[1].abs() >= 0.5),
            ]);
            let next = &body.position + &toward;
            body.commit_position(next, world, out);
        }
        let lost = body
            .senses
            .prey_distance(&body.position, world.grid.as_ref())
            .is_none_or(|d| d > params.escape_radius + params.attack_radius);
        if lost {
            out.trigger(AgentFlag::OnTargetLost);
        }
    }
}
