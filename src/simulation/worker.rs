//! RTS gatherers.
//!
//! Workers do not evolve. They walk to the closest mine, gather gold until
//! full and carry it back to the town center. Paths come from the
//! [`PathSystem`](super::systems::PathSystem): a worker queues a
//! [`SimEvent::RequestPath`], the request lands in its
//! [`PathRequestComponent`] and the resolved path is handed back to the body
//! before the next behaviour pass.

use std::collections::VecDeque;
use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::components::{PathRequestComponent, PathResultComponent, TransformComponent};
use super::ecs::{Entity, Tag, World};
use super::environment::Environment;
use super::events::SimEvent;
use super::fsm::{Fsm, FsmBlueprint, FsmKey, Machine, StateBehaviour, TickOutput};
use super::grid::{GridPos, NodeTerrain};

/// Tag carried by every worker entity.
pub const WORKER_TAG: Tag = Tag(3);

/// Worker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Looking for something to do.
    Idle,
    /// Walking to a mine.
    Walk,
    /// Taking gold out of a mine.
    Gather,
    /// Carrying gold to the town center.
    Deliver,
}

impl FsmKey for WorkerState {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

/// Worker flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerFlag {
    /// A mine with gold was chosen.
    OnMineFound,
    /// The destination was reached.
    OnTargetReach,
    /// The worker carries as much as it can.
    OnFull,
    /// The load was dropped at the town center.
    OnDelivered,
    /// The mine ran out of gold.
    OnMineEmpty,
    /// The destination cannot be reached.
    OnTargetLost,
}

impl FsmKey for WorkerFlag {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}

/// Machine binding for workers.
pub struct WorkerMachine;

impl Machine for WorkerMachine {
    type State = WorkerState;
    type Flag = WorkerFlag;
    type Agent = WorkerBody;
    type World = Environment;
    type Event = SimEvent;
}

/// Worker data the behaviours act on.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerBody {
    /// Entity id in the store.
    pub entity: Entity,
    /// Current cell.
    pub position: GridPos,
    /// Gold carried.
    pub gold: u32,
    /// Maximum gold carried.
    pub capacity: u32,
    /// Cell the worker is heading to.
    pub destination: Option<GridPos>,
    /// Remaining cells to the destination.
    pub path: VecDeque<GridPos>,
    /// Whether a path request is in flight.
    pub awaiting_path: bool,
}

impl WorkerBody {
    fn head_to(&mut self, to: GridPos, out: &mut TickOutput<WorkerMachine>) {
        self.destination = Some(to);
        self.path.clear();
        if to == self.position {
            return;
        }
        self.awaiting_path = true;
        out.emit(SimEvent::RequestPath {
            entity: self.entity,
            from: self.position,
            to,
        });
    }

    /// Takes one step along the path. Returns `true` once at the destination.
    fn advance(&mut self) -> bool {
        if let Some(next) = self.path.pop_front() {
            self.position = next;
        }
        self.destination == Some(self.position)
    }

    /// Accepts a resolved path.
    pub fn receive_path(&mut self, path: Vec<GridPos>) {
        self.path = path.into();
        self.awaiting_path = false;
    }
}

/// A worker and its machine.
pub struct Worker {
    /// Data the behaviours act on.
    pub body: WorkerBody,
    /// Behaviour machine.
    pub fsm: Fsm<WorkerMachine>,
}

impl Worker {
    /// Creates a worker at `cell` together with its entity and components.
    pub fn spawn(
        world: &mut World,
        cell: GridPos,
        capacity: u32,
        blueprint: Arc<FsmBlueprint<WorkerMachine>>,
    ) -> Self {
        let entity = world.create_entity();
        world.add_component(
            entity,
            PathRequestComponent {
                from: cell,
                to: cell,
                pending: false,
            },
        );
        world.add_component(entity, PathResultComponent::default());
        world.add_component(
            entity,
            TransformComponent {
                position: cell.to_position(),
                forward: Array1::from_vec(vec![1.0, 0.0]),
            },
        );
        world.set_tag(entity, WORKER_TAG);

        Self {
            body: WorkerBody {
                entity,
                position: cell,
                gold: 0,
                capacity,
                destination: None,
                path: VecDeque::new(),
                awaiting_path: false,
            },
            fsm: Fsm::new(blueprint, WorkerState::Idle),
        }
    }
}

/// Builds the worker transition table.
pub fn blueprint() -> FsmBlueprint<WorkerMachine> {
    let mut bp = FsmBlueprint::new();
    bp.set_transition(WorkerState::Idle, WorkerFlag::OnMineFound, WorkerState::Walk)
        .set_transition(WorkerState::Idle, WorkerFlag::OnFull, WorkerState::Deliver)
        .set_transition(WorkerState::Walk, WorkerFlag::OnTargetReach, WorkerState::Gather)
        .set_transition(WorkerState::Walk, WorkerFlag::OnMineEmpty, WorkerState::Idle)
        .set_transition(WorkerState::Walk, WorkerFlag::OnTargetLost, WorkerState::Idle)
        .set_transition(WorkerState::Gather, WorkerFlag::OnFull, WorkerState::Deliver)
        .set_transition(WorkerState::Gather, WorkerFlag::OnMineEmpty, WorkerState::Idle)
        .set_transition(WorkerState::Deliver, WorkerFlag::OnDelivered, WorkerState::Idle)
        .set_transition(WorkerState::Deliver, WorkerFlag::OnTargetLost, WorkerState::Idle);
    bp.add_behaviour(WorkerState::Idle, Idle)
        .add_behaviour(WorkerState::Walk, Walk)
        .add_behaviour(WorkerState::Gather, Gather)
        .add_behaviour(WorkerState::Deliver, Deliver);
    bp
}

fn has_gold(world: &Environment, cell: GridPos) -> bool {
    world
        .grid
        .node(cell)
        .is_some_and(|n| n.terrain == NodeTerrain::Mine && n.food > 0)
}

/// Picks the closest mine, or heads home with a partial load.
pub struct Idle;

impl StateBehaviour<WorkerMachine> for Idle {
    fn on_enter(&self, body: &mut WorkerBody) {
        body.destination = None;
        body.path.clear();
    }

    fn on_tick(
        &self,
        _step: usize,
        body: &mut WorkerBody,
        world: &Environment,
        out: &mut TickOutput<WorkerMachine>,
    ) {
        if body.gold > 0 && world.town_center.is_some() {
            out.trigger(WorkerFlag::OnFull);
            return;
        }
        let closest = world
            .grid
            .nodes_with(NodeTerrain::Mine)
            .into_iter()
            .min_by_key(|mine| mine.manhattan(body.position));
        if let Some(mine) = closest {
            body.head_to(mine, out);
            out.trigger(WorkerFlag::OnMineFound);
        }
    }
}

/// Follows the path to the chosen mine.
pub struct Walk;

impl StateBehaviour<WorkerMachine> for Walk {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut WorkerBody,
        world: &Environment,
        out: &mut TickOutput<WorkerMachine>,
    ) {
        let Some(mine) = body.destination else {
            out.trigger(WorkerFlag::OnTargetLost);
            return;
        };
        if !has_gold(world, mine) {
            out.trigger(WorkerFlag::OnMineEmpty);
            return;
        }
        if body.awaiting_path {
            return;
        }
        if body.advance() {
            out.trigger(WorkerFlag::OnTargetReach);
        } else if body.path.is_empty() {
            out.trigger(WorkerFlag::OnTargetLost);
        }
    }
}

/// Takes gold out of the mine, one unit per tick.
///
/// Who gets the gold is decided on the coordinating thread, which also raises
/// `OnFull` and `OnMineEmpty`.
pub struct Gather;

impl StateBehaviour<WorkerMachine> for Gather {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut WorkerBody,
        _world: &Environment,
        out: &mut TickOutput<WorkerMachine>,
    ) {
        out.emit(SimEvent::Gather {
            entity: body.entity,
            cell: body.position,
        });
    }
}

/// Walks to the town center and drops the load.
pub struct Deliver;

impl StateBehaviour<WorkerMachine> for Deliver {
    fn on_tick(
        &self,
        _step: usize,
        body: &mut WorkerBody,
        world: &Environment,
        out: &mut TickOutput<WorkerMachine>,
    ) {
        let Some(town) = world.town_center else {
            out.trigger(WorkerFlag::OnTargetLost);
            return;
        };
        if body.destination != Some(town) {
            body.head_to(town, out);
            return;
        }
        if body.awaiting_path {
            return;
        }
        if body.advance() {
            out.emit(SimEvent::Delivered {
                entity: body.entity,
                gold: body.gold,
            });
            body.gold = 0;
            out.trigger(WorkerFlag::OnDelivered);
        } else if body.path.is_empty() {
            out.trigger(WorkerFlag::OnTargetLost);
        }
    }
}
