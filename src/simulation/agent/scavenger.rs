//! Scavenger behaviours: steer freely, flock, eat corpses.

use super::{AgentFlag, AgentMachine, AgentState, Body, CorpseEat, Inert, Species, corpse_in_reach};
use crate::simulation::brain::BrainType;
use crate::simulation::environment::Environment;
use crate::simulation::fsm::{FsmBlueprint, StateBehaviour, TickOutput};
use crate::simulation::geometric_utils::{is_finite, length, normalized, rotate};

const APPROACH_REWARD: f32 = 0.1;
const FLOCK_REWARD: f32 = 0.05;

/// Builds the scavenger transition table.
pub fn blueprint() -> FsmBlueprint<AgentMachine> {
    let mut bp = FsmBlueprint::new();
    bp.set_transition(AgentState::Flocking, AgentFlag::OnTargetReach, AgentState::Eat)
        .set_transition(AgentState::Eat, AgentFlag::OnTargetLost, AgentState::Flocking)
        .set_transition(AgentState::Eat, AgentFlag::OnFull, AgentState::Flocking);
    bp.add_behaviour(AgentState::Flocking, Flocking)
        .add_behaviour(
            AgentState::Eat,
            CorpseEat {
                rewarded: BrainType::ScavengerMovement,
            },
        )
        .add_behaviour(AgentState::Dead, Inert);
    bp
}

/// Turns by the movement brain and blends in the flocking offsets.
///
/// Movement outputs are (left, right) turn forces. The four flocking outputs
/// weight alignment, cohesion, separation and direction-to-corpse.
pub struct Flocking;

impl StateBehaviour<AgentMachine> for Flocking {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        let params = &world.params;
        if body.food < params.max_food && corpse_in_reach(body, world) {
            out.trigger(AgentFlag::OnTargetReach);
            return;
        }
        let Species::Scavenger(scavenger) = &body.species else {
            return;
        };

        let turn = match body.output(BrainType::ScavengerMovement) {
            [left, right, ..] => (left - right) * params.scavenger_turn_rate * world.dt,
            _ => 0.0,
        };
        let weights = match body.output(BrainType::Flocking) {
            [a, c, s, d, ..] => [*a, *c, *s, *d],
            _ => [0.0; 4],
        };
        let heading = rotate(&body.forward, turn);
        let velocity = &heading * params.scavenger_speed + scavenger.boid.offsets.blend(weights);
        let stats = scavenger.boid.stats.clone();

        let before = body.senses.corpse.as_ref().map(|c| world.grid.distance(&body.position, c));
        let next = &body.position + &(&velocity * world.dt);
        if is_finite(&velocity) && length(&velocity) > f32::EPSILON {
            body.forward = normalized(&velocity);
        }
        body.commit_position(next, world, out);

        if let (Some(corpse), Some(before)) = (body.senses.corpse.as_ref(), before) {
            if world.grid.distance(&body.position, corpse) < before {
                body.reward(BrainType::ScavengerMovement, APPROACH_REWARD, out);
            } else {
                body.punish(BrainType::ScavengerMovement, out);
            }
        }

        if stats.neighbours > 0 {
            let comfortable = 1.0..=params.flock_radius / 2.0;
            if comfortable.contains(&stats.nearest_distance) {
                body.reward(BrainType::Flocking, FLOCK_REWARD, out);
            } else {
                body.punish(BrainType::Flocking, out);
            }
        }
    }
}
