#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use evo_swarm::simulation::agent::{
    Agent, AgentFlag, AgentMachine, AgentState, AgentType, Blueprints, Body, Species, Target,
    senses,
};
use evo_swarm::simulation::brain::BrainType;
use evo_swarm::simulation::components::NeuralNetComponent;
use evo_swarm::simulation::ecs::{Entity, World};
use evo_swarm::simulation::environment::Environment;
use evo_swarm::simulation::events::{SimEvent, apply_events};
use evo_swarm::simulation::fsm::TickOutput;
use evo_swarm::simulation::grid::{Grid, GridPos, GridWorld, Node, NodeTerrain};
use evo_swarm::simulation::params::Params;
use evo_swarm::simulation::population::Simulation;
use evo_swarm::simulation::spatial::SpatialIndex;
use ndarray::{Array1, array};

const SIZE: usize = 16;

fn create_test_params() -> Params {
    Params {
        grid_width: SIZE,
        grid_height: SIZE,
        herbivore_count: 2,
        carnivore_count: 1,
        scavenger_count: 0,
        worker_count: 0,
        plant_count: 0,
        herbivore_hp: 2,
        attack_damage: 1,
        max_threads: 1,
        ..Params::default()
    }
}

fn environment() -> Environment {
    Environment::new(Box::new(Grid::new(SIZE, SIZE)), create_test_params())
}

fn spawn(world: &mut World, agent_type: AgentType, cell: GridPos) -> Agent {
    Agent::spawn(world, agent_type, cell, &create_test_params(), &Blueprints::new()).unwrap()
}

fn set_output(body: &mut Body, brain: BrainType, values: Vec<f32>) {
    let slot = body.brain_slot(brain).unwrap();
    body.outputs[slot] = values;
}

/// One behaviour tick followed by the deferred transition.
fn tick(agent: &mut Agent, env: &Environment) -> Vec<SimEvent> {
    let events = agent.fsm.tick(0, &mut agent.body, env);
    agent.fsm.apply_transition(&mut agent.body);
    events
}

fn predator_at(position: Array1<f32>) -> Option<Target> {
    Some(Target {
        entity: 999,
        position,
    })
}

fn create_simulation() -> Simulation {
    let params = create_test_params();
    Simulation::new(params, Box::new(Grid::new(SIZE, SIZE))).unwrap()
}

fn entities_of(sim: &Simulation, agent_type: AgentType) -> Vec<Entity> {
    sim.agents()
        .iter()
        .filter(|a| a.agent_type() == agent_type)
        .map(|a| a.body.entity)
        .collect()
}

fn place(sim: &mut Simulation, entity: Entity, position: Array1<f32>) {
    let body = &mut sim.agent_mut(entity).unwrap().body;
    body.last_valid_position.assign(&position);
    body.position = position;
}

fn hp(sim: &Simulation, entity: Entity) -> i32 {
    match &sim.agent(entity).unwrap().body.species {
        Species::Herbivore(h) => h.hp,
        _ => unreachable!(),
    }
}

fn fitness(sim: &Simulation, entity: Entity, brain: BrainType) -> f32 {
    let net = sim.world().get_component::<NeuralNetComponent>(entity).unwrap();
    net.fitness.fitness(net.slot(brain).unwrap())
}

#[test]
fn test_herbivore_walks_onto_plant_and_eats() {
    let env = environment();
    let mut world = World::new();
    let mut herbivore = spawn(&mut world, AgentType::Herbivore, GridPos::new(4, 4));
    let entity = herbivore.body.entity;

    herbivore.body.senses.plant = Some(array![5.0, 4.0]);
    set_output(&mut herbivore.body, BrainType::Movement, vec![1.0, 0.5]);
    let events = tick(&mut herbivore, &env);

    assert_eq!(herbivore.body.position, array![5.0, 4.0]);
    assert_eq!(herbivore.fsm.current(), AgentState::Eat);
    assert!(events.contains(&SimEvent::Reward {
        entity,
        brain: BrainType::Movement,
        amount: 1.0,
    }));

    herbivore.body.senses.cell = Node {
        terrain: NodeTerrain::Plant,
        food: 3,
    };
    set_output(&mut herbivore.body, BrainType::Eat, vec![0.9]);
    let events = tick(&mut herbivore, &env);
    assert_eq!(
        events,
        vec![SimEvent::EatPlant {
            entity,
            cell: GridPos::new(5, 4),
        }]
    );
    assert_eq!(herbivore.fsm.current(), AgentState::Eat);

    // Standing on food without eating is punished.
    set_output(&mut herbivore.body, BrainType::Eat, vec![0.1]);
    let events = tick(&mut herbivore, &env);
    assert_eq!(
        events,
        vec![SimEvent::Punish {
            entity,
            brain: BrainType::Eat,
        }]
    );

    herbivore.body.senses.cell = Node::default();
    tick(&mut herbivore, &env);
    assert_eq!(herbivore.fsm.current(), AgentState::Walk);
}

#[test]
fn test_herbivore_escapes_and_calms_down() {
    let env = environment();
    let mut world = World::new();
    let mut herbivore = spawn(&mut world, AgentType::Herbivore, GridPos::new(8, 8));
    let entity = herbivore.body.entity;

    herbivore.body.senses.predator = predator_at(array![10.0, 8.0]);
    tick(&mut herbivore, &env);
    assert_eq!(herbivore.fsm.current(), AgentState::Escape);

    herbivore.body.position = array![8.0, 8.0];
    set_output(&mut herbivore.body, BrainType::Escape, vec![0.0, 0.5]);
    let events = tick(&mut herbivore, &env);
    assert_eq!(herbivore.body.position, array![7.0, 8.0]);
    assert!(events.contains(&SimEvent::Reward {
        entity,
        brain: BrainType::Escape,
        amount: 0.5,
    }));
    // Still within the escape radius.
    assert_eq!(herbivore.fsm.current(), AgentState::Escape);

    herbivore.body.senses.predator = None;
    tick(&mut herbivore, &env);
    assert_eq!(herbivore.fsm.current(), AgentState::Walk);

    herbivore.fsm.force_state(AgentState::Eat, &mut herbivore.body);
    herbivore.body.senses.predator = predator_at(array![8.0, 9.0]);
    let events = tick(&mut herbivore, &env);
    assert!(events.is_empty());
    assert_eq!(herbivore.fsm.current(), AgentState::Escape);
}

#[test]
fn test_carnivore_strike_lowers_prey_hp_and_kills() {
    let mut sim = create_simulation();
    let env = environment();
    let prey = entities_of(&sim, AgentType::Herbivore)[0];
    let hunter = entities_of(&sim, AgentType::Carnivore)[0];
    place(&mut sim, prey, array![6.0, 5.0]);
    place(&mut sim, hunter, array![5.0, 5.0]);

    let events = {
        let agent = sim.agent_mut(hunter).unwrap();
        agent.fsm.force_state(AgentState::Attack, &mut agent.body);
        agent.body.senses.prey = Some(Target {
            entity: prey,
            position: array![6.0, 5.0],
        });
        set_output(&mut agent.body, BrainType::Attack, vec![0.9]);
        agent.fsm.tick(0, &mut agent.body, &env)
    };
    let strike = SimEvent::Strike {
        attacker: hunter,
        target: prey,
        damage: 1,
    };
    assert_eq!(events, vec![strike.clone()]);

    apply_events(&mut sim, events);
    assert_eq!(hp(&sim, prey), 1);
    assert!(fitness(&sim, hunter, BrainType::Attack) > 0.0);

    apply_events(&mut sim, vec![strike]);
    assert_eq!(hp(&sim, prey), 0);
    assert_eq!(sim.agent(prey).unwrap().fsm.current(), AgentState::Dead);
    let carnivore = sim.agent(hunter).unwrap();
    assert!(matches!(&carnivore.body.species, Species::Carnivore(c) if c.kills == 1));
    assert_eq!(carnivore.fsm.pending(), Some(AgentFlag::OnTargetLost));

    let agent = sim.agent_mut(hunter).unwrap();
    agent.fsm.apply_transition(&mut agent.body);
    assert_eq!(agent.fsm.current(), AgentState::Walk);
}

#[test]
fn test_carnivore_hesitating_in_range_is_punished() {
    let env = environment();
    let mut world = World::new();
    let mut carnivore = spawn(&mut world, AgentType::Carnivore, GridPos::new(5, 5));
    let entity = carnivore.body.entity;
    carnivore.fsm.force_state(AgentState::Attack, &mut carnivore.body);
    carnivore.body.senses.prey = Some(Target {
        entity: 42,
        position: array![6.0, 5.0],
    });
    set_output(&mut carnivore.body, BrainType::Attack, vec![0.1]);

    let events = carnivore.fsm.tick(0, &mut carnivore.body, &env);
    assert_eq!(
        events,
        vec![SimEvent::Punish {
            entity,
            brain: BrainType::Attack,
        }]
    );
}

#[test]
fn test_strike_dropped_when_prey_moved_away() {
    let mut sim = create_simulation();
    let prey = entities_of(&sim, AgentType::Herbivore)[0];
    let hunter = entities_of(&sim, AgentType::Carnivore)[0];
    place(&mut sim, hunter, array![5.0, 5.0]);
    place(&mut sim, prey, array![12.0, 5.0]);

    apply_events(
        &mut sim,
        vec![SimEvent::Strike {
            attacker: hunter,
            target: prey,
            damage: 1,
        }],
    );

    assert_eq!(hp(&sim, prey), 2);
    assert_eq!(fitness(&sim, hunter, BrainType::Attack), 0.0);
}

#[test]
fn test_strike_reaches_across_the_edge() {
    let mut sim = create_simulation();
    let prey = entities_of(&sim, AgentType::Herbivore)[0];
    let hunter = entities_of(&sim, AgentType::Carnivore)[0];
    place(&mut sim, hunter, array![0.2, 5.0]);
    place(&mut sim, prey, array![15.5, 5.0]);

    apply_events(
        &mut sim,
        vec![SimEvent::Strike {
            attacker: hunter,
            target: prey,
            damage: 1,
        }],
    );

    assert_eq!(hp(&sim, prey), 1);
}

#[test]
fn test_first_eater_gets_the_last_unit() {
    let mut sim = create_simulation();
    let herbivores = entities_of(&sim, AgentType::Herbivore);
    let (first, second) = (herbivores[0], herbivores[1]);
    let cell = GridPos::new(3, 3);
    sim.grid_mut().set_terrain(cell, NodeTerrain::Plant);
    sim.grid_mut().set_food(cell, 1);

    apply_events(
        &mut sim,
        vec![
            SimEvent::EatPlant {
                entity: first,
                cell,
            },
            SimEvent::EatPlant {
                entity: second,
                cell,
            },
        ],
    );

    assert_eq!(sim.agent(first).unwrap().body.food, 1);
    assert_eq!(sim.agent(second).unwrap().body.food, 0);
    assert!(fitness(&sim, first, BrainType::Eat) > 0.0);
    assert_eq!(fitness(&sim, second, BrainType::Eat), 0.0);
    assert_eq!(
        *sim.grid().node(cell).unwrap(),
        Node {
            terrain: NodeTerrain::Grass,
            food: 0,
        }
    );
}

#[test]
fn test_corpse_eating() {
    let env = environment();
    let mut world = World::new();
    let mut carnivore = spawn(&mut world, AgentType::Carnivore, GridPos::new(2, 2));
    let entity = carnivore.body.entity;

    // A corpse in reach sends a walking carnivore to eat.
    carnivore.body.senses.corpse = Some(array![2.0, 2.0]);
    tick(&mut carnivore, &env);
    assert_eq!(carnivore.fsm.current(), AgentState::Eat);

    let events = tick(&mut carnivore, &env);
    assert_eq!(
        events,
        vec![SimEvent::EatCorpse {
            entity,
            cell: GridPos::new(2, 2),
            brain: BrainType::Movement,
        }]
    );

    carnivore.body.food = env.params.max_food;
    tick(&mut carnivore, &env);
    assert_eq!(carnivore.fsm.current(), AgentState::Walk);

    carnivore.body.food = 0;
    carnivore.fsm.force_state(AgentState::Eat, &mut carnivore.body);
    carnivore.body.senses.corpse = None;
    tick(&mut carnivore, &env);
    assert_eq!(carnivore.fsm.current(), AgentState::Walk);
}

#[test]
fn test_non_finite_step_holds_last_valid_position() {
    let env = environment();
    let mut world = World::new();
    let mut herbivore = spawn(&mut world, AgentType::Herbivore, GridPos::new(3, 3));
    let entity = herbivore.body.entity;

    let mut out = TickOutput::<AgentMachine>::default();
    herbivore.body.grid_step(&[f32::NAN, 0.5], &env, &mut out);
    assert_eq!(herbivore.body.position, array![3.0, 3.0]);
    assert_eq!(herbivore.body.position, herbivore.body.last_valid_position);
    assert_eq!(out.into_events(), vec![SimEvent::NumericFault { entity }]);

    let mut out = TickOutput::<AgentMachine>::default();
    herbivore
        .body
        .commit_position(array![f32::INFINITY, 1.0], &env, &mut out);
    assert_eq!(herbivore.body.position, array![3.0, 3.0]);
    assert_eq!(out.into_events(), vec![SimEvent::NumericFault { entity }]);

    // A finite move is wrapped and becomes the new fallback.
    let mut out = TickOutput::<AgentMachine>::default();
    herbivore
        .body
        .commit_position(array![16.5, -0.5], &env, &mut out);
    assert_eq!(herbivore.body.position, array![0.5, 15.5]);
    assert_eq!(herbivore.body.last_valid_position, array![0.5, 15.5]);
    assert!(out.into_events().is_empty());
}

#[test]
fn test_nan_brain_output_faults_through_behaviour() {
    let env = environment();
    let mut world = World::new();
    let mut herbivore = spawn(&mut world, AgentType::Herbivore, GridPos::new(6, 6));
    let entity = herbivore.body.entity;
    set_output(&mut herbivore.body, BrainType::Movement, vec![0.5, f32::NAN]);

    let events = tick(&mut herbivore, &env);

    assert_eq!(events, vec![SimEvent::NumericFault { entity }]);
    assert_eq!(herbivore.body.position, array![6.0, 6.0]);
}

#[test]
fn test_nearest_target_wraps_around_the_edge() {
    let mut grid = Grid::new(SIZE, SIZE);
    for x in [5, 15] {
        grid.set_terrain(GridPos::new(x, 8), NodeTerrain::Plant);
        grid.set_food(GridPos::new(x, 8), 3);
    }
    let index = SpatialIndex::build(&grid, &[]).unwrap();

    let nearest = index.plants.nearest(&array![0.5, 8.0], None).unwrap();
    assert_eq!(nearest.position, array![15.0, 8.0]);
    assert_eq!(index.plants.within(&array![0.5, 8.0], 2.0, None).len(), 1);
    assert_eq!(grid.offset(&array![0.5, 8.0], &array![15.0, 8.0]), array![-1.5, 0.0]);
    assert_eq!(grid.distance(&array![8.0, 0.5], &array![8.0, 15.5]), 1.0);
}

#[test]
fn test_plant_offset_input_uses_wrapped_delta() {
    let env = environment();
    let mut world = World::new();
    let mut herbivore = spawn(&mut world, AgentType::Herbivore, GridPos::new(0, 8));
    herbivore.body.position = array![0.5, 8.0];
    herbivore.body.senses.plant = Some(array![15.0, 8.0]);

    let inputs = senses::inputs(&herbivore.body, env.grid.as_ref(), &env.params);
    let movement = &inputs[herbivore.body.brain_slot(BrainType::Movement).unwrap()];

    assert_eq!(movement[2], -1.5 / SIZE as f32);
    assert_eq!(movement[3], 0.0);
    assert_eq!(movement[4], 1.0);
}
