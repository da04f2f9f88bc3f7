//! Generation loop with parallel agent updates.
//!
//! The [`Simulation`] owns every agent, the entity-component store, the grid
//! and the genome pools. One call to [`Simulation::step`]:
//! - builds the spatial index and senses in parallel,
//! - runs the registered systems (brain evaluation, path finding),
//! - hands brain outputs and paths back to the agents,
//! - runs every behaviour sub-step as a parallel batch pass followed by a
//!   serial event drain,
//! - applies the pending transitions and syncs transforms.
//!
//! When the generation time is up, [`Simulation::epoch`] purges the agents
//! that did not make it, evolves the survivors' brains and refills every
//! species to its target size.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::agent::{Agent, AgentType, Blueprints, senses};
use super::brain::BrainType;
use super::components::{
    BoidConfigComponent, InputComponent, NeuralNetComponent, OutputComponent, PathResultComponent,
    TransformComponent,
};
use super::ecs::{Entity, Systems, World};
use super::environment::Environment;
use super::error::{Result, SimError};
use super::events::{self, SimEvent};
use super::fsm::FsmBlueprint;
use super::genetic::GeneticAlgorithm;
use super::genome::Genome;
use super::grid::{GridPos, GridWorld};
use super::params::Params;
use super::persistence::{GenerationSelector, JsonWeightStore, WeightStore};
use super::spatial::SpatialIndex;
use super::systems::{NeuralNetSystem, PathSystem};
use super::worker::{self, Worker, WorkerMachine};

/// Upper bound on worker threads regardless of configuration.
pub const MAX_THREADS: usize = 32;

/// Cooperative request to end the current generation early.
///
/// Cloning shares the flag. The simulation checks it between ticks and runs
/// an epoch when it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests an early epoch.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether an early epoch was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// What kind of thing a snapshot record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// A neural agent.
    Agent(AgentType),
    /// An RTS worker.
    Worker,
}

/// Read-only record handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Entity id.
    pub entity: Entity,
    /// Kind of the entity.
    pub kind: SnapshotKind,
    /// Position in grid units.
    pub position: [f32; 2],
    /// Whether the entity still acts.
    pub alive: bool,
}

/// The simulation context.
pub struct Simulation {
    pub(crate) env: Environment,
    pub(crate) world: World,
    pub(crate) agents: Vec<Agent>,
    pub(crate) agent_index: HashMap<Entity, usize>,
    pub(crate) workers: Vec<Worker>,
    pub(crate) worker_index: HashMap<Entity, usize>,
    pub(crate) gold: u64,
    systems: Systems,
    genome_pool: HashMap<(AgentType, BrainType), Vec<Genome>>,
    ga: GeneticAlgorithm,
    generation: u32,
    elapsed: f32,
    time: f32,
    cancel: CancelHandle,
    pool: rayon::ThreadPool,
    store: Option<Box<dyn WeightStore>>,
    blueprints: Blueprints,
    worker_blueprint: Arc<FsmBlueprint<WorkerMachine>>,
}

fn target_count(params: &Params, agent_type: AgentType) -> usize {
    match agent_type {
        AgentType::Herbivore => params.herbivore_count,
        AgentType::Carnivore => params.carnivore_count,
        AgentType::Scavenger => params.scavenger_count,
    }
}

fn spawn_cell(grid: &dyn GridWorld, agent_type: AgentType) -> GridPos {
    match agent_type {
        AgentType::Herbivore => grid.random_position_in_upper_quarter(),
        AgentType::Carnivore => grid.random_position_in_lower_quarter(),
        AgentType::Scavenger => grid.random_position(),
    }
}

impl Simulation {
    /// Creates a simulation over `grid` and spawns the first generation.
    ///
    /// A JSON weight store under `params.weights_dir` is attached when saving
    /// or loading is enabled; saved weights are applied right away when
    /// `params.load_generation` is set.
    pub fn new(params: Params, grid: Box<dyn GridWorld>) -> Result<Self> {
        params.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.max_threads.min(MAX_THREADS))
            .build()?;
        let ga = GeneticAlgorithm::new(
            params.elite_count,
            params.mutation_chance,
            params.mutation_rate,
            params.crossover_points,
        );
        let store: Option<Box<dyn WeightStore>> =
            (params.save_weights || params.load_generation.is_some()).then(|| {
                Box::new(JsonWeightStore::new(&params.weights_dir)) as Box<dyn WeightStore>
            });

        let mut world = World::new();
        let mut systems = Systems::new();
        systems.register(Box::new(NeuralNetSystem::new()));
        systems.register(Box::new(PathSystem::new()));
        systems.initialize(&mut world);

        let mut sim = Self {
            env: Environment::new(grid, params),
            world,
            agents: Vec::new(),
            agent_index: HashMap::new(),
            workers: Vec::new(),
            worker_index: HashMap::new(),
            gold: 0,
            systems,
            genome_pool: HashMap::new(),
            ga,
            generation: 0,
            elapsed: 0.0,
            time: 0.0,
            cancel: CancelHandle::default(),
            pool,
            store,
            blueprints: Blueprints::new(),
            worker_blueprint: Arc::new(worker::blueprint()),
        };

        let params = sim.env.params.clone();
        sim.env.grid.seed_plants(params.plant_count, params.plant_food);
        if params.worker_count > 0 {
            let town = sim.env.grid.place_mines(params.mine_count, params.mine_gold);
            sim.env.town_center = Some(town);
            for _ in 0..params.worker_count {
                let worker = Worker::spawn(
                    &mut sim.world,
                    town,
                    params.worker_capacity,
                    Arc::clone(&sim.worker_blueprint),
                );
                sim.workers.push(worker);
            }
        }
        for agent_type in AgentType::ALL {
            for _ in 0..target_count(&params, agent_type) {
                sim.spawn_agent(agent_type)?;
            }
        }
        sim.rebuild_index();

        if let Some(selector) = params.load_generation {
            sim.load_weights(selector);
        }
        info!(
            herbivores = params.herbivore_count,
            carnivores = params.carnivore_count,
            scavengers = params.scavenger_count,
            workers = params.worker_count,
            "simulation created"
        );
        Ok(sim)
    }

    /// Advances the simulation by one tick of `dt` seconds.
    ///
    /// Runs an epoch instead if one was requested through the
    /// [`CancelHandle`], and after the tick if the generation time is up.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if self.cancel.take() {
            info!(generation = self.generation, "generation ended early");
            return self.epoch();
        }

        self.env.dt = dt;
        self.time += dt;

        self.sense()?;
        {
            let systems = &mut self.systems;
            let world = &self.world;
            self.pool.install(|| systems.run(world));
        }
        self.collect_outputs();
        self.run_behaviours();
        self.apply_transitions();
        self.sync_transforms();
        self.check_collapse();

        self.elapsed += dt;
        debug!(time = self.time, elapsed = self.elapsed, "tick");
        if self.elapsed >= self.env.params.generation_duration {
            self.epoch()?;
        }
        Ok(())
    }

    /// Steps with `dt` until the generation counter advances.
    pub fn run_generation(&mut self, dt: f32) -> Result<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimError::Config(format!("dt must be positive, got {dt}")));
        }
        let start = self.generation;
        while self.generation == start {
            self.step(dt)?;
        }
        Ok(())
    }

    /// Ends the current generation.
    ///
    /// Agents failing their survival predicate are removed. Each species is
    /// then either refilled with fresh random brains (one survivor or none)
    /// or evolved from its survivors' genomes up to the target size.
    pub fn epoch(&mut self) -> Result<()> {
        self.generation += 1;
        let params = self.env.params.clone();

        let before = self.agents.len();
        let (survivors, purged): (Vec<Agent>, Vec<Agent>) =
            std::mem::take(&mut self.agents).into_iter().partition(|a| a.survives(&params));
        for agent in &purged {
            self.world.remove_entity(agent.body.entity);
        }
        self.agents = survivors;
        self.rebuild_index();
        debug!(purged = purged.len(), before, "purged agents");

        if params.save_weights && self.generation % params.save_every.max(1) == 0 {
            self.save_weights();
        }

        self.env.grid.clear_transient();
        self.env.grid.seed_plants(params.plant_count, params.plant_food);

        for agent_type in AgentType::ALL {
            self.repopulate(agent_type, &params)?;
        }
        self.rebuild_index();

        self.elapsed = (self.elapsed - params.generation_duration).max(0.0);
        info!(
            generation = self.generation,
            herbivores = self.population(AgentType::Herbivore),
            carnivores = self.population(AgentType::Carnivore),
            scavengers = self.population(AgentType::Scavenger),
            gold = self.gold,
            "epoch"
        );
        Ok(())
    }

    fn repopulate(&mut self, agent_type: AgentType, params: &Params) -> Result<()> {
        let target = target_count(params, agent_type);
        let survivors = self.indices_of(agent_type);

        if survivors.len() <= 1 {
            if target > 0 {
                info!(
                    species = agent_type.name(),
                    survivors = survivors.len(),
                    "repopulating with fresh brains"
                );
            }
            self.remove_agents(&survivors);
            for _ in 0..target {
                self.spawn_agent(agent_type)?;
            }
            self.reset_species(agent_type, params);
            return Ok(());
        }

        for &brain in agent_type.brain_set() {
            let genomes = self.harvest(&survivors, brain);
            let genome_len = genomes.first().map_or(0, Genome::len);
            let next = self.ga.epoch(&genomes, target, genome_len);
            self.genome_pool.insert((agent_type, brain), next);
        }

        if survivors.len() > target {
            self.remove_agents(&survivors[target..]);
        }
        let have = self.indices_of(agent_type).len();
        for _ in have..target {
            self.spawn_agent(agent_type)?;
        }

        let members = self.indices_of(agent_type);
        let mut rng = rand::rng();
        for &brain in agent_type.brain_set() {
            let Some(pool) = self.genome_pool.get_mut(&(agent_type, brain)) else {
                continue;
            };
            pool.shuffle(&mut rng);
            for (&idx, genome) in members.iter().zip(pool.iter()) {
                let entity = self.agents[idx].body.entity;
                if let Some(net) = self.world.get_component_mut::<NeuralNetComponent>(entity) {
                    if let Some(slot) = net.slot(brain) {
                        net.brains[slot].set_weights(&genome.weights)?;
                    }
                }
            }
        }
        self.reset_species(agent_type, params);
        Ok(())
    }

    fn harvest(&self, members: &[usize], brain: BrainType) -> Vec<Genome> {
        members
            .iter()
            .filter_map(|&idx| {
                let net = self
                    .world
                    .get_component::<NeuralNetComponent>(self.agents[idx].body.entity)?;
                let slot = net.slot(brain)?;
                Some(Genome::from_weights(net.brains[slot].weights(), net.fitness.fitness(slot)))
            })
            .collect()
    }

    fn reset_species(&mut self, agent_type: AgentType, params: &Params) {
        for idx in self.indices_of(agent_type) {
            let cell = spawn_cell(self.env.grid.as_ref(), agent_type);
            let agent = &mut self.agents[idx];
            agent.reset(cell, params);
            if let Some(net) = self
                .world
                .get_component_mut::<NeuralNetComponent>(agent.body.entity)
            {
                net.fitness.reset();
            }
        }
    }

    fn spawn_agent(&mut self, agent_type: AgentType) -> Result<()> {
        let cell = spawn_cell(self.env.grid.as_ref(), agent_type);
        let agent = Agent::spawn(
            &mut self.world,
            agent_type,
            cell,
            &self.env.params,
            &self.blueprints,
        )?;
        self.agent_index.insert(agent.body.entity, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    fn remove_agents(&mut self, indices: &[usize]) {
        let doomed: Vec<Entity> = indices.iter().map(|&i| self.agents[i].body.entity).collect();
        for &entity in &doomed {
            self.world.remove_entity(entity);
        }
        self.agents.retain(|a| !doomed.contains(&a.body.entity));
        self.rebuild_index();
    }

    fn indices_of(&self, agent_type: AgentType) -> Vec<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, a)| a.agent_type() == agent_type)
            .map(|(i, _)| i)
            .collect()
    }

    fn rebuild_index(&mut self) {
        self.agent_index = self
            .agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.body.entity, i))
            .collect();
        self.worker_index = self
            .workers
            .iter()
            .enumerate()
            .map(|(i, w)| (w.body.entity, i))
            .collect();
    }

    fn sense(&mut self) -> Result<()> {
        let index = SpatialIndex::build(self.env.grid.as_ref(), &self.agents)
            .map_err(|e| SimError::Spatial(format!("{e:?}")))?;
        let boids = self.world.components::<BoidConfigComponent>();
        let grid = self.env.grid.as_ref();
        let params = &self.env.params;
        let agents = &mut self.agents;

        let inputs: Vec<(Entity, Vec<Vec<f32>>)> = self.pool.install(|| {
            agents
                .par_iter_mut()
                .map(|agent| {
                    let config = boids.as_ref().and_then(|b| b.get(agent.body.entity)).copied();
                    senses::sense(&mut agent.body, &index, grid, config.as_ref());
                    (agent.body.entity, senses::inputs(&agent.body, grid, params))
                })
                .collect()
        });
        drop(boids);

        if let Some(mut storage) = self.world.components_mut::<InputComponent>() {
            for (entity, vectors) in inputs {
                if let Some(input) = storage.get_mut(entity) {
                    input.inputs = vectors;
                }
            }
        }
        Ok(())
    }

    fn collect_outputs(&mut self) {
        if let Some(outputs) = self.world.components::<OutputComponent>() {
            for agent in &mut self.agents {
                if let Some(out) = outputs.get(agent.body.entity) {
                    agent.body.outputs.clone_from(&out.outputs);
                }
            }
        }
        if let Some(mut results) = self.world.components_mut::<PathResultComponent>() {
            for worker in &mut self.workers {
                if let Some(result) = results.get_mut(worker.body.entity) {
                    if result.ready {
                        result.ready = false;
                        worker.body.receive_path(std::mem::take(&mut result.path));
                    }
                }
            }
        }
    }

    fn run_behaviours(&mut self) {
        let agent_steps = self.agents.iter().map(|a| a.fsm.steps()).max().unwrap_or(0);
        let steps = agent_steps.max(usize::from(!self.workers.is_empty()));
        let batch = self.env.params.batch_size;

        for step in 0..steps {
            let env = &self.env;
            let agents = &mut self.agents;
            let workers = &mut self.workers;
            let events: Vec<SimEvent> = self.pool.install(|| {
                let mut events: Vec<SimEvent> = agents
                    .par_chunks_mut(batch)
                    .flat_map_iter(|chunk| {
                        chunk
                            .iter_mut()
                            .flat_map(|agent| agent.fsm.tick(step, &mut agent.body, env))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                let worker_events: Vec<SimEvent> = workers
                    .par_chunks_mut(batch)
                    .flat_map_iter(|chunk| {
                        chunk
                            .iter_mut()
                            .flat_map(|worker| worker.fsm.tick(step, &mut worker.body, env))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                events.extend(worker_events);
                events
            });
            trace!(step, events = events.len(), "behaviour pass");
            events::apply_events(self, events);
        }
    }

    fn apply_transitions(&mut self) {
        for agent in &mut self.agents {
            if let Some(transition) = agent.fsm.apply_transition(&mut agent.body) {
                trace!(
                    entity = agent.body.entity,
                    from = ?transition.from,
                    to = ?transition.to,
                    "transition"
                );
            }
        }
        for worker in &mut self.workers {
            if let Some(transition) = worker.fsm.apply_transition(&mut worker.body) {
                trace!(
                    entity = worker.body.entity,
                    from = ?transition.from,
                    to = ?transition.to,
                    "transition"
                );
            }
        }
    }

    fn sync_transforms(&mut self) {
        let Some(mut transforms) = self.world.components_mut::<TransformComponent>() else {
            return;
        };
        for agent in &self.agents {
            if let Some(t) = transforms.get_mut(agent.body.entity) {
                t.position.assign(&agent.body.position);
                t.forward.assign(&agent.body.forward);
            }
        }
        for worker in &self.workers {
            if let Some(t) = transforms.get_mut(worker.body.entity) {
                t.position = worker.body.position.to_position();
            }
        }
    }

    fn check_collapse(&self) {
        if !self.env.params.epoch_on_collapse || self.cancel.is_cancelled() {
            return;
        }
        let collapsed = AgentType::ALL
            .into_iter()
            .find(|&t| target_count(&self.env.params, t) > 0 && self.population(t) == 0);
        if let Some(agent_type) = collapsed {
            info!(species = agent_type.name(), "population collapsed, requesting epoch");
            self.cancel.cancel();
        }
    }

    fn save_weights(&self) {
        let Some(store) = &self.store else {
            return;
        };
        for agent_type in AgentType::ALL {
            let members = self.indices_of(agent_type);
            if members.is_empty() {
                continue;
            }
            for &brain in agent_type.brain_set() {
                let weights: Vec<Vec<f32>> = self
                    .harvest(&members, brain)
                    .into_iter()
                    .map(|g| g.weights)
                    .collect();
                if let Err(e) = store.save_weights(agent_type, brain, &weights, self.generation) {
                    warn!(
                        species = agent_type.name(),
                        brain = brain.name(),
                        error = %e,
                        "saving weights failed"
                    );
                }
            }
        }
        debug!(generation = self.generation, "weights saved");
    }

    /// Applies saved weights from the attached store to the current agents.
    ///
    /// Saved vectors are dealt round-robin when there are fewer of them than
    /// agents. Failures are logged and leave the brains untouched.
    pub fn load_weights(&mut self, selector: GenerationSelector) {
        let Some(store) = &self.store else {
            warn!("no weight store attached, nothing loaded");
            return;
        };
        for agent_type in AgentType::ALL {
            let loaded = match store.load_weights(agent_type, selector) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!(species = agent_type.name(), error = %e, "loading weights failed");
                    continue;
                }
            };
            let members: Vec<Entity> = self
                .agents
                .iter()
                .filter(|a| a.agent_type() == agent_type)
                .map(|a| a.body.entity)
                .collect();
            for (brain, weights) in loaded {
                if weights.is_empty() {
                    continue;
                }
                for (i, &entity) in members.iter().enumerate() {
                    let Some(net) = self.world.get_component_mut::<NeuralNetComponent>(entity)
                    else {
                        continue;
                    };
                    let Some(slot) = net.slot(brain) else {
                        continue;
                    };
                    if let Err(e) = net.brains[slot].set_weights(&weights[i % weights.len()]) {
                        warn!(entity, brain = brain.name(), error = %e, "saved weights do not fit");
                    }
                }
            }
        }
    }

    /// Removes `damage` hit points from a herbivore, killing it at zero.
    ///
    /// Returns `true` if the herbivore died from this hit.
    pub fn apply_damage(&mut self, entity: Entity, damage: i32) -> bool {
        events::damage_agent(self, entity, damage)
    }

    /// Position, kind and liveness of every agent and worker.
    pub fn snapshot(&self) -> Vec<SnapshotRecord> {
        let agents = self.agents.iter().map(|a| SnapshotRecord {
            entity: a.body.entity,
            kind: SnapshotKind::Agent(a.agent_type()),
            position: [a.body.position[0], a.body.position[1]],
            alive: a.is_alive(),
        });
        let workers = self.workers.iter().map(|w| SnapshotRecord {
            entity: w.body.entity,
            kind: SnapshotKind::Worker,
            position: [w.body.position.x as f32, w.body.position.y as f32],
            alive: true,
        });
        agents.chain(workers).collect()
    }

    /// Number of living agents of `agent_type`.
    pub fn population(&self, agent_type: AgentType) -> usize {
        self.agents
            .iter()
            .filter(|a| a.agent_type() == agent_type && a.is_alive())
            .count()
    }

    /// Sets the target size of a species, applied at the next epoch.
    pub fn set_population(&mut self, agent_type: AgentType, count: usize) {
        let params = &mut self.env.params;
        match agent_type {
            AgentType::Herbivore => params.herbivore_count = count,
            AgentType::Carnivore => params.carnivore_count = count,
            AgentType::Scavenger => params.scavenger_count = count,
        }
    }

    /// Sets the mutation jitter.
    pub fn set_mutation_rate(&mut self, rate: f32) -> Result<()> {
        self.update_params(|p| p.mutation_rate = rate)?;
        self.ga.mutation_rate = rate;
        Ok(())
    }

    /// Sets the per-weight mutation probability.
    pub fn set_mutation_chance(&mut self, chance: f32) -> Result<()> {
        self.update_params(|p| p.mutation_chance = chance)?;
        self.ga.mutation_chance = chance;
        Ok(())
    }

    /// Sets how many genomes survive unchanged.
    pub fn set_elite_count(&mut self, count: usize) {
        self.env.params.elite_count = count;
        self.ga.elite_count = count;
    }

    /// Sets the generation length in seconds.
    pub fn set_generation_duration(&mut self, seconds: f32) -> Result<()> {
        self.update_params(|p| p.generation_duration = seconds)
    }

    /// Enables or disables saving weights every `save_every` generations.
    pub fn set_save_weights(&mut self, enabled: bool) -> Result<()> {
        self.update_params(|p| p.save_weights = enabled)?;
        if enabled && self.store.is_none() {
            self.store = Some(Box::new(JsonWeightStore::new(&self.env.params.weights_dir)));
        }
        Ok(())
    }

    /// Applies `change` to a copy of the parameters and keeps it only if it
    /// still validates.
    fn update_params(&mut self, change: impl FnOnce(&mut Params)) -> Result<()> {
        let mut params = self.env.params.clone();
        change(&mut params);
        params.validate()?;
        self.env.params = params;
        Ok(())
    }

    /// Sets which saved generation to load and loads it right away.
    pub fn set_load_generation(&mut self, selector: Option<GenerationSelector>) {
        self.env.params.load_generation = selector;
        if let Some(selector) = selector {
            if self.store.is_none() {
                self.store = Some(Box::new(JsonWeightStore::new(&self.env.params.weights_dir)));
            }
            self.load_weights(selector);
        }
    }

    /// Replaces the persistence collaborator.
    pub fn set_weight_store(&mut self, store: Box<dyn WeightStore>) {
        self.store = Some(store);
    }

    /// Handle that ends the current generation early.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Completed epochs.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Total simulated seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Seconds into the current generation.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Gold delivered by workers so far.
    pub fn gold(&self) -> u64 {
        self.gold
    }

    /// Current parameters.
    pub fn params(&self) -> &Params {
        &self.env.params
    }

    /// Grid collaborator.
    pub fn grid(&self) -> &dyn GridWorld {
        self.env.grid.as_ref()
    }

    /// Mutable grid collaborator.
    pub fn grid_mut(&mut self) -> &mut dyn GridWorld {
        self.env.grid.as_mut()
    }

    /// Entity-component store.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Neural agents, alive and dead.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent owning `entity`.
    pub fn agent(&self, entity: Entity) -> Option<&Agent> {
        self.agent_index.get(&entity).map(|&i| &self.agents[i])
    }

    /// Mutable agent owning `entity`.
    pub fn agent_mut(&mut self, entity: Entity) -> Option<&mut Agent> {
        self.agent_index.get(&entity).map(|&i| &mut self.agents[i])
    }

    /// RTS workers.
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Genomes produced for `(agent_type, brain)` at the last epoch.
    pub fn genome_pool(&self, agent_type: AgentType, brain: BrainType) -> Option<&[Genome]> {
        self.genome_pool.get(&(agent_type, brain)).map(Vec::as_slice)
    }
}
