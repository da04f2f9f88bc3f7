//! Neural agents and their behaviour wiring.
//!
//! Every agent is a [`Body`] driven by an [`Fsm`] over [`AgentMachine`].
//! Species-specific data lives in the [`Species`] variant, and each species
//! has its own [`FsmBlueprint`] built in the species submodule.

use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub mod carnivore;
pub mod herbivore;
pub mod scavenger;
pub mod senses;

pub use senses::{Senses, Target};

use super::brain::{Brain, BrainType};
use super::components::{
    BoidConfigComponent, InputComponent, NeuralNetComponent, OutputComponent, TransformComponent,
};
use super::ecs::{Entity, Tag, World};
use super::environment::Environment;
use super::error::{Result, SimError};
use super::events::SimEvent;
use super::flocking::Boid;
use super::fsm::{Fsm, FsmBlueprint, FsmKey, Machine, StateBehaviour, TickOutput};
use super::geometric_utils::{is_finite, normalized};
use super::grid::GridPos;
use super::params::Params;

/// Evolving species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentType {
    /// Eats plants, flees carnivores.
    Herbivore,
    /// Hunts herbivores, eats corpses.
    Carnivore,
    /// Flocks and eats corpses.
    Scavenger,
}

impl AgentType {
    /// Every evolving species.
    pub const ALL: [AgentType; 3] = [
        AgentType::Herbivore,
        AgentType::Carnivore,
        AgentType::Scavenger,
    ];

    /// Brains owned by this species, in slot order.
    pub fn brain_set(self) -> &'static [BrainType] {
        match self {
            AgentType::Herbivore => &[BrainType::Eat, BrainType::Movement, BrainType::Escape],
            AgentType::Carnivore => &[BrainType::Movement, BrainType::Attack],
            AgentType::Scavenger => &[BrainType::ScavengerMovement, BrainType::Flocking],
        }
    }

    /// Lower-case name used for file paths and logs.
    pub fn name(self) -> &'static str {
        match self {
            AgentType::Herbivore => "herbivore",
            AgentType::Carnivore => "carnivore",
            AgentType::Scavenger => "scavenger",
        }
    }

    /// State every agent of this species starts in.
    pub fn initial_state(self) -> AgentState {
        match self {
            AgentType::Herbivore | AgentType::Carnivore => AgentState::Walk,
            AgentType::Scavenger => AgentState::Flocking,
        }
    }
}

impl From<AgentType> for Tag {
    fn from(agent_type: AgentType) -> Self {
        Tag(agent_type as u32)
    }
}

/// Input and output widths of a brain, or an error if the species does not own it.
pub fn brain_shape(agent_type: AgentType, brain_type: BrainType) -> Result<(usize, usize)> {
    let shape = match (agent_type, brain_type) {
        (AgentType::Herbivore, BrainType::Movement) => (6, 2),
        (AgentType::Herbivore, BrainType::Eat) => (4, 1),
        (AgentType::Herbivore, BrainType::Escape) => (5, 2),
        (AgentType::Carnivore, BrainType::Movement) => (6, 2),
        (AgentType::Carnivore, BrainType::Attack) => (4, 1),
        (AgentType::Scavenger, BrainType::ScavengerMovement) => (7, 2),
        (AgentType::Scavenger, BrainType::Flocking) => (6, 4),
        (agent, brain) => return Err(SimError::InvalidBrain { agent, brain }),
    };
    Ok(shape)
}

/// Builds one randomly initialized brain for `agent_type`.
pub fn build_brain(agent_type: AgentType, brain_type: BrainType, params: &Params) -> Result<Brain> {
    let (inputs, outputs) = brain_shape(agent_type, brain_type)?;
    let mut sizes = Vec::with_capacity(params.hidden_layers.len() + 2);
    sizes.push(inputs);
    sizes.extend_from_slice(&params.hidden_layers);
    sizes.push(outputs);
    Brain::with_topology(brain_type, agent_type, &sizes, params.bias, params.sigmoid_p)
}

/// FSM states shared by every neural species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Moving on the grid.
    Walk,
    /// Eating what lies under the agent.
    Eat,
    /// Moving away from a predator.
    Escape,
    /// Striking and chasing prey.
    Attack,
    /// Free movement blended with flocking.
    Flocking,
    /// No longer acting.
    Dead,
}

impl FsmKey for AgentState {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}

/// FSM flags shared by every neural species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentFlag {
    /// Standing on food.
    OnTargetReach,
    /// The food or prey is gone.
    OnTargetLost,
    /// Food counter reached the maximum.
    OnFull,
    /// A predator came close.
    OnEscape,
    /// The predator is far enough.
    OnSafe,
    /// Prey is within strike range.
    OnPreyNear,
    /// Hit points ran out.
    OnDeath,
}

impl FsmKey for AgentFlag {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        self as usize
    }
}

/// Machine binding for neural agents.
pub struct AgentMachine;

impl Machine for AgentMachine {
    type State = AgentState;
    type Flag = AgentFlag;
    type Agent = Body;
    type World = Environment;
    type Event = SimEvent;
}

/// Herbivore-only state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Herbivore {
    /// Hit points; the herbivore dies at 0.
    pub hp: i32,
}

/// Carnivore-only state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Carnivore {
    /// Herbivores killed this generation.
    pub kills: u32,
}

/// Scavenger-only state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scavenger {
    /// Flocking sub-object.
    pub boid: Boid,
}

/// Species-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Species {
    /// See [`Herbivore`].
    Herbivore(Herbivore),
    /// See [`Carnivore`].
    Carnivore(Carnivore),
    /// See [`Scavenger`].
    Scavenger(Scavenger),
}

impl Species {
    /// Fresh species data for `agent_type`.
    pub fn new(agent_type: AgentType, params: &Params) -> Self {
        match agent_type {
            AgentType::Herbivore => Species::Herbivore(Herbivore {
                hp: params.herbivore_hp,
            }),
            AgentType::Carnivore => Species::Carnivore(Carnivore::default()),
            AgentType::Scavenger => Species::Scavenger(Scavenger {
                boid: Boid::new(params.flock_radius),
            }),
        }
    }

    /// The tag of this variant.
    pub fn agent_type(&self) -> AgentType {
        match self {
            Species::Herbivore(_) => AgentType::Herbivore,
            Species::Carnivore(_) => AgentType::Carnivore,
            Species::Scavenger(_) => AgentType::Scavenger,
        }
    }
}

/// Everything an agent's behaviours read and write during a tick.
#[derive(Debug, Clone)]
pub struct Body {
    /// Entity id in the store.
    pub entity: Entity,
    /// Position in grid units.
    pub position: Array1<f32>,
    /// Last position known to be finite.
    pub last_valid_position: Array1<f32>,
    /// Unit heading.
    pub forward: Array1<f32>,
    /// Food eaten this generation.
    pub food: u32,
    /// Brain type per slot.
    pub brains: Vec<BrainType>,
    /// Latest brain outputs per slot.
    pub outputs: Vec<Vec<f32>>,
    /// What the agent sensed this tick.
    pub senses: Senses,
    /// Species-specific data.
    pub species: Species,
}

impl Body {
    /// Slot of `brain_type`, if this body owns it.
    pub fn brain_slot(&self, brain_type: BrainType) -> Option<usize> {
        self.brains.iter().position(|&b| b == brain_type)
    }

    /// Latest outputs of `brain_type` (empty if unknown or not yet evaluated).
    pub fn output(&self, brain_type: BrainType) -> &[f32] {
        self.brain_slot(brain_type)
            .and_then(|slot| self.outputs.get(slot))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Cell under the agent.
    pub fn cell(&self) -> GridPos {
        GridPos::from_position(&self.position)
    }

    /// Moves to `next`, or holds the last valid position if `next` is not finite.
    pub fn commit_position(
        &mut self,
        next: Array1<f32>,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        if is_finite(&next) {
            let mut next = next;
            world.grid.wrap(&mut next);
            self.position.assign(&next);
            self.last_valid_position.assign(&next);
        } else {
            self.position.assign(&self.last_valid_position);
            out.emit(SimEvent::NumericFault {
                entity: self.entity,
            });
        }
    }

    /// Steps one cell according to a two-output steering brain.
    ///
    /// Outputs above `0.5 + dead_zone` move in the positive direction, outputs
    /// below `0.5 - dead_zone` in the negative one.
    pub fn grid_step(
        &mut self,
        outputs: &[f32],
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        let dz = world.params.move_dead_zone;
        let axis = |v: Option<&f32>| match v {
            Some(&v) if v > 0.5 + dz => 1.0,
            Some(&v) if v < 0.5 - dz => -1.0,
            Some(&v) if v.is_nan() => f32::NAN,
            _ => 0.0,
        };
        let delta = Array1::from_vec(vec![axis(outputs.first()), axis(outputs.get(1))]);
        if delta.iter().any(|d| *d != 0.0) && is_finite(&delta) {
            self.forward = normalized(&delta);
        }
        let next = &self.position + &delta;
        self.commit_position(next, world, out);
    }

    /// Queues a reward for `brain_type`.
    pub fn reward(&self, brain_type: BrainType, amount: f32, out: &mut TickOutput<AgentMachine>) {
        out.emit(SimEvent::Reward {
            entity: self.entity,
            brain: brain_type,
            amount,
        });
    }

    /// Queues a punishment for `brain_type`.
    pub fn punish(&self, brain_type: BrainType, out: &mut TickOutput<AgentMachine>) {
        out.emit(SimEvent::Punish {
            entity: self.entity,
            brain: brain_type,
        });
    }
}

/// Blueprints for every species.
pub struct Blueprints {
    herbivore: Arc<FsmBlueprint<AgentMachine>>,
    carnivore: Arc<FsmBlueprint<AgentMachine>>,
    scavenger: Arc<FsmBlueprint<AgentMachine>>,
}

impl Default for Blueprints {
    fn default() -> Self {
        Self::new()
    }
}

impl Blueprints {
    /// Builds every species blueprint.
    pub fn new() -> Self {
        Self {
            herbivore: Arc::new(herbivore::blueprint()),
            carnivore: Arc::new(carnivore::blueprint()),
            scavenger: Arc::new(scavenger::blueprint()),
        }
    }

    /// Blueprint of `agent_type`.
    pub fn for_type(&self, agent_type: AgentType) -> Arc<FsmBlueprint<AgentMachine>> {
        match agent_type {
            AgentType::Herbivore => Arc::clone(&self.herbivore),
            AgentType::Carnivore => Arc::clone(&self.carnivore),
            AgentType::Scavenger => Arc::clone(&self.scavenger),
        }
    }
}

/// A neural agent: its body and the machine driving it.
pub struct Agent {
    /// Data the behaviours act on.
    pub body: Body,
    /// Behaviour machine.
    pub fsm: Fsm<AgentMachine>,
}

impl Agent {
    /// Creates an agent, its entity and all of its components.
    pub fn spawn(
        world: &mut World,
        agent_type: AgentType,
        cell: GridPos,
        params: &Params,
        blueprints: &Blueprints,
    ) -> Result<Self> {
        let brains = agent_type
            .brain_set()
            .iter()
            .map(|&brain_type| build_brain(agent_type, brain_type, params))
            .collect::<Result<Vec<_>>>()?;

        let entity = world.create_entity();
        let inputs = brains.iter().map(|b| vec![0.0; b.inputs_count()]).collect();
        let outputs: Vec<Vec<f32>> = brains.iter().map(|b| vec![0.0; b.outputs_count()]).collect();

        let position = cell.to_position();
        let forward = random_heading();

        world.add_component(entity, NeuralNetComponent::new(brains));
        world.add_component(entity, InputComponent { inputs });
        world.add_component(
            entity,
            OutputComponent {
                outputs: outputs.clone(),
            },
        );
        world.add_component(
            entity,
            TransformComponent {
                position: position.clone(),
                forward: forward.clone(),
            },
        );
        if agent_type == AgentType::Scavenger {
            world.add_component(
                entity,
                BoidConfigComponent {
                    radius: params.flock_radius,
                    ..BoidConfigComponent::default()
                },
            );
        }
        world.set_tag(entity, agent_type.into());

        let body = Body {
            entity,
            last_valid_position: position.clone(),
            position,
            forward,
            food: 0,
            brains: agent_type.brain_set().to_vec(),
            outputs,
            senses: Senses::default(),
            species: Species::new(agent_type, params),
        };
        let fsm = Fsm::new(blueprints.for_type(agent_type), agent_type.initial_state());
        Ok(Self { body, fsm })
    }

    /// Species of this agent.
    pub fn agent_type(&self) -> AgentType {
        self.body.species.agent_type()
    }

    /// Whether the agent still acts this generation.
    pub fn is_alive(&self) -> bool {
        match &self.body.species {
            Species::Herbivore(h) => h.hp > 0,
            Species::Carnivore(_) | Species::Scavenger(_) => true,
        }
    }

    /// Whether the agent makes it into the next generation.
    pub fn survives(&self, params: &Params) -> bool {
        self.is_alive() && self.body.food >= params.food_to_survive
    }

    /// Puts the agent back into a fresh generation at `cell`.
    pub fn reset(&mut self, cell: GridPos, params: &Params) {
        let position = cell.to_position();
        self.body.position.assign(&position);
        self.body.last_valid_position.assign(&position);
        self.body.forward = random_heading();
        self.body.food = 0;
        self.body.senses = Senses::default();
        for out in &mut self.body.outputs {
            out.iter_mut().for_each(|v| *v = 0.0);
        }
        let agent_type = self.agent_type();
        self.body.species = Species::new(agent_type, params);
        self.fsm.force_state(agent_type.initial_state(), &mut self.body);
    }
}

fn random_heading() -> Array1<f32> {
    let angle = rand::random::<f32>() * std::f32::consts::TAU;
    Array1::from_vec(vec![angle.cos(), angle.sin()])
}

/// Behaviour of a state that does nothing, such as [`AgentState::Dead`].
pub struct Inert;

impl StateBehaviour<AgentMachine> for Inert {
    fn on_tick(
        &self,
        _step: usize,
        _body: &mut Body,
        _world: &Environment,
        _out: &mut TickOutput<AgentMachine>,
    ) {
    }
}

/// Eating a corpse within reach; shared by carnivores and scavengers.
pub struct CorpseEat {
    /// Brain rewarded for every unit eaten.
    pub rewarded: BrainType,
}

impl StateBehaviour<AgentMachine> for CorpseEat {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut Body,
        world: &Environment,
        out: &mut TickOutput<AgentMachine>,
    ) {
        let params = &world.params;
        if body.food >= params.max_food {
            out.trigger(AgentFlag::OnFull);
            return;
        }
        let Some(corpse) = body.senses.corpse.clone() else {
            out.trigger(AgentFlag::OnTargetLost);
            return;
        };
        if world.grid.distance(&body.position, &corpse) > params.eat_radius {
            out.trigger(AgentFlag::OnTargetLost);
            return;
        }
        out.emit(SimEvent::EatCorpse {
            entity: body.entity,
            cell: GridPos::from_position(&corpse),
            brain: self.rewarded,
        });
    }
}

/// Whether a corpse lies within eating reach of the body.
pub(crate) fn corpse_in_reach(body: &Body, world: &Environment) -> bool {
    body.senses
        .corpse
        .as_ref()
        .is_some_and(|c| world.grid.distance(&body.position, c) <= world.params.eat_radius)
}
