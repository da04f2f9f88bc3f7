//! Event system for thread-safe simulation state updates.
//!
//! Behaviours run in parallel and may only touch their own agent. Everything
//! that affects the grid, another agent or the fitness ledgers is queued as a
//! [`SimEvent`] and applied serially by [`apply_events`] once the parallel
//! pass has joined.

use tracing::{debug, warn};

use super::agent::{AgentFlag, AgentState, Species};
use super::brain::BrainType;
use super::components::{NeuralNetComponent, PathRequestComponent};
use super::ecs::Entity;
use super::grid::{GridPos, NodeTerrain};
use super::population::Simulation;
use super::worker::WorkerFlag;

/// Fitness granted to a carnivore for landing a strike.
const STRIKE_REWARD: f32 = 1.0;
/// Fitness granted to a carnivore for a kill.
const KILL_REWARD: f32 = 2.0;
/// Fitness granted for every unit of food eaten.
const EAT_REWARD: f32 = 1.0;
/// Food left in the corpse of a killed herbivore.
const CORPSE_FOOD: u32 = 1;

/// Side effects queued by behaviours.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Raise a brain's fitness.
    Reward {
        /// Agent that earned it.
        entity: Entity,
        /// Brain to credit.
        brain: BrainType,
        /// Base amount, scaled by the brain's modifier.
        amount: f32,
    },
    /// Shrink a brain's fitness modifier.
    Punish {
        /// Agent that made the mistake.
        entity: Entity,
        /// Brain to blame.
        brain: BrainType,
    },
    /// A herbivore eats one unit of the plant at `cell`.
    EatPlant {
        /// Eating herbivore.
        entity: Entity,
        /// Plant cell.
        cell: GridPos,
    },
    /// An agent eats one unit of the corpse at `cell`.
    EatCorpse {
        /// Eating agent.
        entity: Entity,
        /// Corpse cell.
        cell: GridPos,
        /// Brain credited for the meal.
        brain: BrainType,
    },
    /// A carnivore strikes a herbivore.
    Strike {
        /// Striking carnivore.
        attacker: Entity,
        /// Struck herbivore.
        target: Entity,
        /// Hit points removed.
        damage: i32,
    },
    /// Movement produced a non-finite position and was rolled back.
    NumericFault {
        /// Affected agent.
        entity: Entity,
    },
    /// A worker needs a path.
    RequestPath {
        /// Requesting worker.
        entity: Entity,
        /// Start cell.
        from: GridPos,
        /// Goal cell.
        to: GridPos,
    },
    /// A worker takes one unit of gold from the mine at `cell`.
    Gather {
        /// Gathering worker.
        entity: Entity,
        /// Mine cell.
        cell: GridPos,
    },
    /// A worker dropped its load at the town center.
    Delivered {
        /// Delivering worker.
        entity: Entity,
        /// Units of gold delivered.
        gold: u32,
    },
}

/// Applies all queued events to the simulation state, in order.
///
/// Contended resources (plant food, corpse food, mine gold) go to whoever
/// queued first; later claims find the cell empty and are dropped.
pub fn apply_events(sim: &mut Simulation, events: Vec<SimEvent>) {
    for event in events {
        match event {
            SimEvent::Reward { entity, brain, amount } => reward(sim, entity, brain, amount),
            SimEvent::Punish { entity, brain } => punish(sim, entity, brain),
            SimEvent::EatPlant { entity, cell } => {
                if take_food(sim, cell, NodeTerrain::Plant) {
                    feed(sim, entity);
                    reward(sim, entity, BrainType::Eat, EAT_REWARD);
                }
            }
            SimEvent::EatCorpse { entity, cell, brain } => {
                if take_food(sim, cell, NodeTerrain::Corpse) {
                    feed(sim, entity);
                    reward(sim, entity, brain, EAT_REWARD);
                }
            }
            SimEvent::Strike {
                attacker,
                target,
                damage,
            } => strike(sim, attacker, target, damage),
            SimEvent::NumericFault { entity } => {
                warn!(entity, "non-finite movement, agent held at last valid position");
            }
            SimEvent::RequestPath { entity, from, to } => {
                let request = PathRequestComponent {
                    from,
                    to,
                    pending: true,
                };
                if !sim.world.add_component(entity, request) {
                    debug!(entity, "path request for unknown entity dropped");
                }
            }
            SimEvent::Gather { entity, cell } => gather(sim, entity, cell),
            SimEvent::Delivered { entity, gold } => {
                sim.gold += u64::from(gold);
                debug!(entity, gold, total = sim.gold, "gold delivered");
            }
        }
    }
}

/// Removes `damage` hit points from the herbivore `target`.
///
/// Returns `true` if this killed it: it is forced into the dead state and
/// its cell becomes a corpse with one unit of food, unless the cell holds a
/// mine or the town center. Anything that is not a
/// living herbivore is left untouched.
pub fn damage_agent(sim: &mut Simulation, target: Entity, damage: i32) -> bool {
    let Some(&idx) = sim.agent_index.get(&target) else {
        return false;
    };
    let agent = &mut sim.agents[idx];
    let Species::Herbivore(herbivore) = &mut agent.body.species else {
        return false;
    };
    if herbivore.hp <= 0 {
        return false;
    }
    herbivore.hp -= damage;
    if herbivore.hp > 0 {
        return false;
    }

    let cell = agent.body.cell();
    agent.fsm.force_state(AgentState::Dead, &mut agent.body);
    leave_corpse(sim, cell);
    debug!(entity = target, x = cell.x, y = cell.y, "herbivore died");
    true
}

/// Turns `cell` into a corpse. Mines and the town center are permanent and
/// keep their terrain; a corpse already there grows by one meal.
fn leave_corpse(sim: &mut Simulation, cell: GridPos) {
    let Some(node) = sim.env.grid.node(cell).copied() else {
        return;
    };
    match node.terrain {
        NodeTerrain::Grass | NodeTerrain::Plant => {
            sim.env.grid.set_terrain(cell, NodeTerrain::Corpse);
            sim.env.grid.set_food(cell, CORPSE_FOOD);
        }
        NodeTerrain::Corpse => sim.env.grid.set_food(cell, node.food + CORPSE_FOOD),
        NodeTerrain::Mine | NodeTerrain::TownCenter => {
            debug!(
                x = cell.x,
                y = cell.y,
                terrain = ?node.terrain,
                "no corpse on permanent terrain"
            );
        }
    }
}

fn strike(sim: &mut Simulation, attacker: Entity, target: Entity, damage: i32) {
    let (Some(&a), Some(&t)) = (sim.agent_index.get(&attacker), sim.agent_index.get(&target)) else {
        return;
    };
    // The prey may have moved during the same sub-step.
    let distance = sim
        .env
        .grid
        .distance(&sim.agents[a].body.position, &sim.agents[t].body.position);
    if distance > sim.env.params.attack_radius || !sim.agents[t].is_alive() {
        return;
    }

    reward(sim, attacker, BrainType::Attack, STRIKE_REWARD);
    if damage_agent(sim, target, damage) {
        reward(sim, attacker, BrainType::Attack, KILL_REWARD);
        let agent = &mut sim.agents[a];
        if let Species::Carnivore(carnivore) = &mut agent.body.species {
            carnivore.kills += 1;
        }
        agent.fsm.request(AgentFlag::OnTargetLost);
    }
}

fn take_food(sim: &mut Simulation, cell: GridPos, terrain: NodeTerrain) -> bool {
    let Some(node) = sim.env.grid.node(cell).copied() else {
        return false;
    };
    if node.terrain != terrain || node.food == 0 {
        return false;
    }
    let left = node.food - 1;
    sim.env.grid.set_food(cell, left);
    if left == 0 {
        sim.env.grid.set_terrain(cell, NodeTerrain::Grass);
    }
    true
}

fn feed(sim: &mut Simulation, entity: Entity) {
    if let Some(&idx) = sim.agent_index.get(&entity) {
        sim.agents[idx].body.food += 1;
    }
}

fn reward(sim: &mut Simulation, entity: Entity, brain: BrainType, amount: f32) {
    let growth = sim.env.params.fitness_growth;
    if let Some(net) = sim.world.get_component_mut::<NeuralNetComponent>(entity) {
        if let Some(slot) = net.slot(brain) {
            net.fitness.reward(slot, amount, growth);
        }
    }
}

fn punish(sim: &mut Simulation, entity: Entity, brain: BrainType) {
    let decay = sim.env.params.fitness_decay;
    if let Some(net) = sim.world.get_component_mut::<NeuralNetComponent>(entity) {
        if let Some(slot) = net.slot(brain) {
            net.fitness.punish(slot, decay);
        }
    }
}

fn gather(sim: &mut Simulation, entity: Entity, cell: GridPos) {
    let Some(&idx) = sim.worker_index.get(&entity) else {
        return;
    };
    let gold = sim
        .env
        .grid
        .node(cell)
        .filter(|n| n.terrain == NodeTerrain::Mine)
        .map_or(0, |n| n.food);
    let worker = &mut sim.workers[idx];
    if gold == 0 {
        worker.fsm.request(WorkerFlag::OnMineEmpty);
        return;
    }
    sim.env.grid.set_food(cell, gold - 1);
    worker.body.gold += 1;
    if worker.body.gold >= worker.body.capacity {
        worker.fsm.request(WorkerFlag::OnFull);
    }
}
