//! Generic finite-state machine with deferred transitions.
//!
//! A machine is described once by an [`FsmBlueprint`]: a fixed
//! `(state, flag) -> next state` table plus one [`StateBehaviour`] per state.
//! Every agent owns a light [`Fsm`] that points at a shared blueprint.
//!
//! Ticking is split in two:
//! - [`Fsm::tick`] runs the current state's behaviour for one sub-step. It may
//!   only touch its own agent and read the shared world, so it is safe to run
//!   for many agents in parallel. Anything else is returned as events.
//! - [`Fsm::apply_transition`] runs on the coordinating thread after the
//!   parallel pass and performs at most one transition (exit, lookup, enter).

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// Enum usable as a state or flag key.
pub trait FsmKey: Copy + Eq + Debug + Send + Sync + 'static {
    /// Number of variants.
    const COUNT: usize;

    /// Dense index in `0..COUNT`.
    fn index(self) -> usize;
}

/// Binds the types a particular machine works with.
pub trait Machine: Sized + 'static {
    /// State enum.
    type State: FsmKey;
    /// Flag enum.
    type Flag: FsmKey;
    /// Per-agent data the behaviours mutate.
    type Agent: Send;
    /// Read-only view shared by every agent during a tick.
    type World: Sync;
    /// Side effect applied later on the coordinating thread.
    type Event: Send;
}

/// Events and flag produced by one behaviour sub-step.
pub struct TickOutput<M: Machine> {
    events: Vec<M::Event>,
    flag: Option<M::Flag>,
}

impl<M: Machine> Default for TickOutput<M> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            flag: None,
        }
    }
}

impl<M: Machine> TickOutput<M> {
    /// Queues an event for the coordinating thread.
    pub fn emit(&mut self, event: M::Event) {
        self.events.push(event);
    }

    /// Requests a transition. Only the first request of a tick counts.
    pub fn trigger(&mut self, flag: M::Flag) {
        if self.flag.is_none() {
            self.flag = Some(flag);
        }
    }

    /// The flag requested so far, if any.
    pub fn flag(&self) -> Option<M::Flag> {
        self.flag
    }

    /// Drains the queued events.
    pub fn into_events(self) -> Vec<M::Event> {
        self.events
    }
}

/// Behaviour bound to one state.
pub trait StateBehaviour<M: Machine>: Send + Sync {
    /// Number of ordered sub-steps this state runs per tick.
    fn steps(&self) -> usize {
        1
    }

    /// Runs when the state is entered.
    fn on_enter(&self, _agent: &mut M::Agent) {}

    /// Runs sub-step `step` of the tick. Must not touch anything but `agent`.
    fn on_tick(&self, step: usize, agent: &mut M::Agent, world: &M::World, out: &mut TickOutput<M>);

    /// Runs when the state is left.
    fn on_exit(&self, _agent: &mut M::Agent) {}
}

/// Transition table and behaviours shared by every agent of one kind.
pub struct FsmBlueprint<M: Machine> {
    table: Vec<Option<M::State>>,
    behaviours: Vec<Option<Arc<dyn StateBehaviour<M>>>>,
}

impl<M: Machine> Default for FsmBlueprint<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Machine> FsmBlueprint<M> {
    /// Creates a blueprint with no transitions and no behaviours.
    pub fn new() -> Self {
        Self {
            table: vec![None; <M::State as FsmKey>::COUNT * <M::Flag as FsmKey>::COUNT],
            behaviours: (0..<M::State as FsmKey>::COUNT).map(|_| None).collect(),
        }
    }

    /// Configures `from --flag--> to`.
    pub fn set_transition(&mut self, from: M::State, flag: M::Flag, to: M::State) -> &mut Self {
        let slot = Self::slot(from, flag);
        self.table[slot] = Some(to);
        self
    }

    /// Binds a behaviour to `state`.
    pub fn add_behaviour(
        &mut self,
        state: M::State,
        behaviour: impl StateBehaviour<M> + 'static,
    ) -> &mut Self {
        self.behaviours[state.index()] = Some(Arc::new(behaviour));
        self
    }

    /// Target of `from --flag-->`, or `None` if no transition is configured.
    pub fn transition(&self, from: M::State, flag: M::Flag) -> Option<M::State> {
        self.table[Self::slot(from, flag)]
    }

    fn behaviour(&self, state: M::State) -> Option<&Arc<dyn StateBehaviour<M>>> {
        self.behaviours[state.index()].as_ref()
    }

    fn slot(state: M::State, flag: M::Flag) -> usize {
        state.index() * <M::Flag as FsmKey>::COUNT + flag.index()
    }
}

/// A state change applied by [`Fsm::apply_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    /// State that was left.
    pub from: S,
    /// State that was entered.
    pub to: S,
}

/// Per-agent machine instance.
pub struct Fsm<M: Machine> {
    blueprint: Arc<FsmBlueprint<M>>,
    current: M::State,
    pending: Option<M::Flag>,
    _machine: PhantomData<fn() -> M>,
}

impl<M: Machine> Fsm<M> {
    /// Creates a machine in `initial` without running its enter behaviour.
    pub fn new(blueprint: Arc<FsmBlueprint<M>>, initial: M::State) -> Self {
        Self {
            blueprint,
            current: initial,
            pending: None,
            _machine: PhantomData,
        }
    }

    /// Current state.
    pub fn current(&self) -> M::State {
        self.current
    }

    /// Flag waiting to be applied, if any.
    pub fn pending(&self) -> Option<M::Flag> {
        self.pending
    }

    /// Number of sub-steps the current state runs per tick.
    pub fn steps(&self) -> usize {
        self.blueprint
            .behaviour(self.current)
            .map_or(0, |b| b.steps())
    }

    /// Runs sub-step `step` of the current state.
    ///
    /// Steps beyond the state's declared count are no-ops. A flag raised by
    /// the behaviour is stored and applied later by [`Fsm::apply_transition`].
    pub fn tick(&mut self, step: usize, agent: &mut M::Agent, world: &M::World) -> Vec<M::Event> {
        let Some(behaviour) = self.blueprint.behaviour(self.current).cloned() else {
            return Vec::new();
        };
        if step >= behaviour.steps() {
            return Vec::new();
        }
        let mut out = TickOutput::default();
        behaviour.on_tick(step, agent, world, &mut out);
        if let Some(flag) = out.flag() {
            self.request(flag);
        }
        out.into_events()
    }

    /// Requests a transition from outside a behaviour. The first request wins.
    pub fn request(&mut self, flag: M::Flag) {
        if self.pending.is_none() {
            self.pending = Some(flag);
        }
    }

    /// Applies the pending flag, if any.
    ///
    /// Runs the old state's exit behaviour and the new state's enter behaviour.
    /// Flags with no configured transition are dropped without changing state.
    pub fn apply_transition(&mut self, agent: &mut M::Agent) -> Option<Transition<M::State>> {
        let flag = self.pending.take()?;
        let to = self.blueprint.transition(self.current, flag)?;
        let from = self.current;

        if let Some(behaviour) = self.blueprint.behaviour(from) {
            behaviour.on_exit(agent);
        }
        self.current = to;
        if let Some(behaviour) = self.blueprint.behaviour(to) {
            behaviour.on_enter(agent);
        }
        Some(Transition { from, to })
    }

    /// Jumps to `state` running exit and enter behaviours, ignoring the table.
    pub fn force_state(&mut self, state: M::State, agent: &mut M::Agent) {
        if let Some(behaviour) = self.blueprint.behaviour(self.current) {
            behaviour.on_exit(agent);
        }
        self.current = state;
        self.pending = None;
        if let Some(behaviour) = self.blueprint.behaviour(state) {
            behaviour.on_enter(agent);
        }
    }
}
