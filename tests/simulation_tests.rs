#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use evo_swarm::simulation::agent::{AgentState, AgentType, Species};
use evo_swarm::simulation::brain::BrainType;
use evo_swarm::simulation::components::NeuralNetComponent;
use evo_swarm::simulation::grid::{Grid, GridPos, GridWorld, Node, NodeTerrain};
use evo_swarm::simulation::params::Params;
use evo_swarm::simulation::population::{Simulation, SnapshotKind};
use evo_swarm::simulation::worker::WorkerState;

fn create_test_params() -> Params {
    Params {
        grid_width: 24,
        grid_height: 24,
        herbivore_count: 10,
        carnivore_count: 5,
        scavenger_count: 0,
        worker_count: 0,
        plant_count: 40,
        generation_duration: 20.0,
        max_threads: 2,
        ..Params::default()
    }
}

fn create_simulation(params: Params) -> Simulation {
    let grid = Grid::new(params.grid_width, params.grid_height);
    Simulation::new(params, Box::new(grid)).unwrap()
}

fn entities_of(sim: &Simulation, agent_type: AgentType) -> Vec<u32> {
    sim.agents()
        .iter()
        .filter(|a| a.agent_type() == agent_type)
        .map(|a| a.body.entity)
        .collect()
}

#[test]
fn test_initial_population_matches_targets() {
    let sim = create_simulation(create_test_params());

    assert_eq!(sim.population(AgentType::Herbivore), 10);
    assert_eq!(sim.population(AgentType::Carnivore), 5);
    assert_eq!(sim.population(AgentType::Scavenger), 0);
    assert_eq!(sim.generation(), 0);

    let height = sim.grid().height() as f32;
    for agent in sim.agents() {
        let y = agent.body.position[1];
        match agent.agent_type() {
            AgentType::Herbivore => assert!(y >= height * 0.75 - 1.0),
            AgentType::Carnivore => assert!(y < height * 0.25 + 1.0),
            AgentType::Scavenger => unreachable!(),
        }
        assert_eq!(agent.fsm.current(), agent.agent_type().initial_state());
    }
}

#[test]
fn test_invalid_params_rejected() {
    let params = Params {
        generation_duration: 0.0,
        ..create_test_params()
    };
    let grid = Grid::new(params.grid_width, params.grid_height);
    assert!(Simulation::new(params, Box::new(grid)).is_err());
}

#[test]
fn test_full_generation_resets_and_refills() {
    let mut sim = create_simulation(create_test_params());

    sim.run_generation(0.1).unwrap();

    assert_eq!(sim.generation(), 1);
    assert!(sim.elapsed() < 0.1 + 1e-3);
    assert_eq!(entities_of(&sim, AgentType::Herbivore).len(), 10);
    assert_eq!(entities_of(&sim, AgentType::Carnivore).len(), 5);
    assert_eq!(sim.population(AgentType::Herbivore), 10);

    for agent in sim.agents() {
        let net = sim.world().get_component::<NeuralNetComponent>(agent.body.entity).unwrap();
        assert!(net.fitness.fitness_values().iter().all(|&f| f == 0.0));
        assert!(net.fitness.modifiers().iter().all(|&m| m == 1.0));
        assert_eq!(agent.body.food, 0);
    }
}

#[test]
fn test_run_generation_rejects_bad_dt() {
    let mut sim = create_simulation(create_test_params());
    assert!(sim.run_generation(0.0).is_err());
    assert!(sim.run_generation(f32::NAN).is_err());
    assert_eq!(sim.generation(), 0);
}

#[test]
fn test_extinct_species_refilled_to_target() {
    let mut sim = create_simulation(create_test_params());

    for entity in entities_of(&sim, AgentType::Herbivore) {
        assert!(sim.apply_damage(entity, 100));
    }
    assert_eq!(sim.population(AgentType::Herbivore), 0);

    sim.epoch().unwrap();

    assert_eq!(sim.population(AgentType::Herbivore), 10);
    assert_eq!(entities_of(&sim, AgentType::Herbivore).len(), 10);
}

#[test]
fn test_killed_herbivore_leaves_corpse_and_is_purged() {
    let mut sim = create_simulation(create_test_params());
    let entity = entities_of(&sim, AgentType::Herbivore)[0];
    let cell = sim.agent(entity).unwrap().body.cell();

    assert!(!sim.apply_damage(entity, 1));
    assert!(sim.apply_damage(entity, 1));
    // Dead herbivores take no further damage.
    assert!(!sim.apply_damage(entity, 1));

    let node = *sim.grid().node(cell).unwrap();
    assert_eq!(node.terrain, NodeTerrain::Corpse);
    assert_eq!(node.food, 1);

    let agent = sim.agent(entity).unwrap();
    assert_eq!(agent.fsm.current(), AgentState::Dead);
    assert!(!agent.is_alive());
    assert_eq!(sim.population(AgentType::Herbivore), 9);

    sim.epoch().unwrap();

    assert!(sim.agent(entity).is_none());
    assert!(!sim.world().contains(entity));
}

#[test]
fn test_damage_ignores_non_herbivores() {
    let mut sim = create_simulation(create_test_params());
    let carnivore = entities_of(&sim, AgentType::Carnivore)[0];

    assert!(!sim.apply_damage(carnivore, 100));
    assert!(sim.agent(carnivore).unwrap().is_alive());
    assert!(!sim.apply_damage(9999, 1));
}

#[test]
fn test_survivors_are_evolved() {
    let params = Params {
        food_to_survive: 0,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);
    let before: Vec<u32> = entities_of(&sim, AgentType::Carnivore);

    sim.epoch().unwrap();

    // Everyone survived, so the same entities carry the evolved brains.
    assert_eq!(entities_of(&sim, AgentType::Carnivore), before);
    for brain in AgentType::Carnivore.brain_set() {
        let pool = sim.genome_pool(AgentType::Carnivore, *brain).unwrap();
        assert_eq!(pool.len(), 5);
        let net = sim.world().get_component::<NeuralNetComponent>(before[0]).unwrap();
        let slot = net.slot(*brain).unwrap();
        assert!(pool.iter().all(|g| g.len() == net.brains[slot].weight_count()));
    }
}

#[test]
fn test_population_target_change_applies_at_epoch() {
    let params = Params {
        food_to_survive: 0,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);

    sim.set_population(AgentType::Herbivore, 4);
    sim.set_population(AgentType::Carnivore, 8);
    assert_eq!(sim.population(AgentType::Herbivore), 10);

    sim.epoch().unwrap();

    assert_eq!(sim.population(AgentType::Herbivore), 4);
    assert_eq!(sim.population(AgentType::Carnivore), 8);
    assert_eq!(sim.genome_pool(AgentType::Carnivore, BrainType::Attack).unwrap().len(), 8);
}

#[test]
fn test_cancel_handle_ends_generation_early() {
    let mut sim = create_simulation(create_test_params());
    let handle = sim.cancel_handle();

    sim.step(0.1).unwrap();
    handle.cancel();
    assert!(handle.is_cancelled());

    sim.step(0.1).unwrap();

    assert_eq!(sim.generation(), 1);
    assert!(!handle.is_cancelled());
    assert_eq!(sim.population(AgentType::Herbivore), 10);
}

#[test]
fn test_collapse_requests_epoch() {
    let params = Params {
        epoch_on_collapse: true,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);
    for entity in entities_of(&sim, AgentType::Herbivore) {
        sim.apply_damage(entity, 100);
    }

    sim.step(0.1).unwrap();
    assert!(sim.cancel_handle().is_cancelled());
    sim.step(0.1).unwrap();

    assert_eq!(sim.generation(), 1);
    assert_eq!(sim.population(AgentType::Herbivore), 10);
}

#[test]
fn test_snapshot_lists_agents_and_workers() {
    let params = Params {
        worker_count: 2,
        ..create_test_params()
    };
    let sim = create_simulation(params);
    let snapshot = sim.snapshot();

    assert_eq!(snapshot.len(), 17);
    assert_eq!(
        snapshot.iter().filter(|r| r.kind == SnapshotKind::Worker).count(),
        2
    );
    assert_eq!(
        snapshot
            .iter()
            .filter(|r| r.kind == SnapshotKind::Agent(AgentType::Herbivore))
            .count(),
        10
    );
    assert!(snapshot.iter().all(|r| r.alive));
}

#[test]
fn test_scavengers_keep_finite_positions() {
    let params = Params {
        herbivore_count: 0,
        carnivore_count: 0,
        scavenger_count: 8,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);

    for _ in 0..50 {
        sim.step(0.1).unwrap();
    }

    let (w, h) = (sim.grid().width() as f32, sim.grid().height() as f32);
    for agent in sim.agents() {
        assert!(matches!(agent.body.species, Species::Scavenger(_)));
        let (x, y) = (agent.body.position[0], agent.body.position[1]);
        assert!(x.is_finite() && y.is_finite());
        assert!((0.0..w).contains(&x) && (0.0..h).contains(&y));
    }
}

#[test]
fn test_no_plants_means_no_plant_target() {
    let params = Params {
        plant_count: 0,
        carnivore_count: 0,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);

    sim.step(0.1).unwrap();

    for agent in sim.agents() {
        assert!(agent.body.senses.plant.is_none());
        assert_eq!(agent.body.food, 0);
    }
}

#[test]
fn test_workers_deliver_gold() {
    let params = Params {
        grid_width: 16,
        grid_height: 16,
        herbivore_count: 0,
        carnivore_count: 0,
        scavenger_count: 0,
        worker_count: 1,
        plant_count: 0,
        mine_count: 1,
        mine_gold: 10,
        worker_capacity: 2,
        generation_duration: 1000.0,
        max_threads: 1,
        ..Params::default()
    };
    let mut sim = create_simulation(params);
    assert_eq!(sim.workers()[0].fsm.current(), WorkerState::Idle);

    for _ in 0..400 {
        sim.step(0.1).unwrap();
        if sim.gold() > 0 {
            break;
        }
    }

    assert_eq!(sim.gold(), 2);
    let mines = sim.grid().nodes_with(NodeTerrain::Mine);
    assert_eq!(mines.len(), 1);
    assert_eq!(sim.grid().node(mines[0]).unwrap().food, 8);
}

#[test]
fn test_setters_reject_invalid_values() {
    let params = Params {
        save_every: 0,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);

    assert!(sim.set_save_weights(true).is_err());
    assert!(!sim.params().save_weights);
    assert!(sim.set_generation_duration(f32::NAN).is_err());
    assert!(sim.set_generation_duration(-1.0).is_err());
    assert!(sim.set_mutation_chance(1.5).is_err());
    assert!(sim.set_mutation_rate(f32::INFINITY).is_err());
    assert_eq!(sim.params().generation_duration, 20.0);

    // The rejected values left a simulation that still reaches its epochs.
    sim.epoch().unwrap();
    sim.set_generation_duration(0.3).unwrap();
    sim.set_mutation_rate(0.2).unwrap();
    sim.run_generation(0.1).unwrap();
    assert_eq!(sim.generation(), 2);
    assert_eq!(sim.params().mutation_rate, 0.2);
}

#[test]
fn test_kills_leave_permanent_terrain_alone() {
    let params = Params {
        worker_count: 1,
        mine_count: 1,
        mine_gold: 10,
        ..create_test_params()
    };
    let mut sim = create_simulation(params);
    let mine = sim.grid().nodes_with(NodeTerrain::Mine)[0];
    let town = sim.workers()[0].body.position;
    let herbivores = entities_of(&sim, AgentType::Herbivore);
    let grass = (0..24)
        .map(|x| GridPos::new(x, 12))
        .find(|&p| sim.grid().node(p).unwrap().terrain == NodeTerrain::Grass)
        .unwrap();

    for (&entity, cell) in herbivores.iter().zip([mine, town, grass, grass]) {
        let agent = sim.agent_mut(entity).unwrap();
        agent.body.position = cell.to_position();
        agent.body.last_valid_position = cell.to_position();
    }
    for &entity in &herbivores[..4] {
        assert!(sim.apply_damage(entity, 100));
    }

    assert_eq!(
        *sim.grid().node(mine).unwrap(),
        Node {
            terrain: NodeTerrain::Mine,
            food: 10,
        }
    );
    assert_eq!(sim.grid().node(town).unwrap().terrain, NodeTerrain::TownCenter);
    // Two deaths on one grass cell stack into a bigger corpse.
    assert_eq!(
        *sim.grid().node(grass).unwrap(),
        Node {
            terrain: NodeTerrain::Corpse,
            food: 2,
        }
    );

    sim.epoch().unwrap();
    assert_eq!(sim.grid().nodes_with(NodeTerrain::Mine), vec![mine]);
    assert_eq!(sim.grid().node(town).unwrap().terrain, NodeTerrain::TownCenter);
}
