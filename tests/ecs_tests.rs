#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::sync::{Arc, Mutex};

use evo_swarm::simulation::agent::{AgentType, build_brain};
use evo_swarm::simulation::brain::BrainType;
use evo_swarm::simulation::components::{
    InputComponent, NeuralNetComponent, OutputComponent, PathRequestComponent, PathResultComponent,
};
use evo_swarm::simulation::ecs::{ComponentStorage, System, Systems, Tag, World};
use evo_swarm::simulation::grid::GridPos;
use evo_swarm::simulation::params::Params;
use evo_swarm::simulation::systems::{NeuralNetSystem, PathSystem, step_path};

#[derive(Debug, Clone, PartialEq)]
struct Health(i32);

#[derive(Debug, Clone, PartialEq)]
struct Speed(f32);

#[test]
fn test_add_and_get_component() {
    let mut world = World::new();
    let e = world.create_entity();

    assert!(world.add_component(e, Health(3)));
    assert_eq!(*world.get_component::<Health>(e).unwrap(), Health(3));
    assert!(world.get_component::<Speed>(e).is_none());
}

#[test]
fn test_add_component_overwrites() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(e, Health(3));
    world.add_component(e, Health(7));

    assert_eq!(*world.get_component::<Health>(e).unwrap(), Health(7));
    assert_eq!(world.components::<Health>().unwrap().len(), 1);
}

#[test]
fn test_add_to_unknown_entity_is_ignored() {
    let mut world = World::new();
    assert!(!world.add_component(42, Health(1)));
    assert!(world.components::<Health>().is_none());
}

#[test]
fn test_write_component_through_shared_world() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(e, Speed(1.0));

    {
        let shared: &World = &world;
        let mut speed = shared.write_component::<Speed>(e).unwrap();
        speed.0 = 2.5;
    }
    assert_eq!(world.get_component_mut::<Speed>(e).unwrap().0, 2.5);
}

#[test]
fn test_query_cache_invalidated_on_structural_change() {
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();
    world.add_component(a, Health(1));
    world.add_component(a, Speed(1.0));
    world.add_component(b, Health(1));

    assert_eq!(world.entities_with::<(Health, Speed)>(), vec![a]);

    world.add_component(b, Speed(2.0));
    assert_eq!(world.entities_with::<(Health, Speed)>(), vec![a, b]);

    world.remove_component::<Health>(a);
    assert_eq!(world.entities_with::<(Speed, Health)>(), vec![b]);
}

#[test]
fn test_remove_entity_releases_components_and_tag() {
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();
    world.add_component(a, Health(1));
    world.add_component(b, Health(2));
    world.set_tag(a, Tag(1));

    assert!(world.remove_entity(a));
    assert!(!world.remove_entity(a));

    assert!(!world.contains(a));
    assert!(world.get_component::<Health>(a).is_none());
    assert_eq!(*world.get_component::<Health>(b).unwrap(), Health(2));
    assert_eq!(world.tag(a), None);
    assert_eq!(world.entities_with::<(Health,)>(), vec![b]);
}

#[test]
fn test_entity_ids_are_not_reused() {
    let mut world = World::new();
    let a = world.create_entity();
    world.remove_entity(a);
    let b = world.create_entity();
    assert_ne!(a, b);
}

#[test]
fn test_tags() {
    let mut world = World::new();
    let herbivore: Tag = AgentType::Herbivore.into();
    let carnivore: Tag = AgentType::Carnivore.into();
    let a = world.create_entity();
    let b = world.create_entity();
    let c = world.create_entity();
    world.set_tag(a, herbivore);
    world.set_tag(b, carnivore);
    world.set_tag(c, herbivore);

    assert_eq!(world.entities_with_tag(herbivore), vec![a, c]);
    assert_eq!(world.tag(b), Some(carnivore));
}

#[test]
fn test_storage_swap_remove_keeps_mapping() {
    let mut storage = ComponentStorage::default();
    storage.insert(1, Health(10));
    storage.insert(2, Health(20));
    storage.insert(3, Health(30));

    assert_eq!(storage.remove(1), Some(Health(10)));
    assert_eq!(storage.get(3), Some(&Health(30)));
    assert_eq!(storage.get(2), Some(&Health(20)));
    assert_eq!(storage.len(), 2);
}

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl System for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn initialize(&mut self, _world: &mut World) {
        self.log.lock().unwrap().push(format!("{}:init", self.name));
    }

    fn pre_execute(&mut self, _world: &World) {
        self.log.lock().unwrap().push(format!("{}:pre", self.name));
    }

    fn execute(&mut self, _world: &World) {
        self.log.lock().unwrap().push(format!("{}:exec", self.name));
    }

    fn post_execute(&mut self, _world: &World) {
        self.log.lock().unwrap().push(format!("{}:post", self.name));
    }
}

#[test]
fn test_systems_run_phases_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut world = World::new();
    let mut systems = Systems::new();
    systems.register(Box::new(Recorder {
        name: "a",
        log: Arc::clone(&log),
    }));
    systems.register(Box::new(Recorder {
        name: "b",
        log: Arc::clone(&log),
    }));
    systems.initialize(&mut world);
    systems.initialize(&mut world);
    systems.run(&world);

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec!["a:init", "b:init", "a:pre", "b:pre", "a:exec", "b:exec", "a:post", "b:post"]
    );
}

#[test]
fn test_neural_net_system_fills_outputs() {
    let params = Params::default();
    let mut world = World::new();
    let e = world.create_entity();
    let brains = vec![
        build_brain(AgentType::Carnivore, BrainType::Movement, &params).unwrap(),
        build_brain(AgentType::Carnivore, BrainType::Attack, &params).unwrap(),
    ];
    let expected: Vec<Vec<f32>> = vec![
        brains[0].think(&[0.5; 6]).unwrap().to_vec(),
        brains[1].think(&[0.5; 4]).unwrap().to_vec(),
    ];
    world.add_component(e, NeuralNetComponent::new(brains));
    world.add_component(
        e,
        InputComponent {
            inputs: vec![vec![0.5; 6], vec![0.5; 4]],
        },
    );
    world.add_component(e, OutputComponent::default());

    let mut systems = Systems::new();
    systems.register(Box::new(NeuralNetSystem::new()));
    systems.initialize(&mut world);
    systems.run(&world);

    assert_eq!(world.get_component::<OutputComponent>(e).unwrap().outputs, expected);
}

#[test]
fn test_neural_net_system_zeroes_bad_inputs() {
    let params = Params::default();
    let mut world = World::new();
    let e = world.create_entity();
    let brain = build_brain(AgentType::Herbivore, BrainType::Eat, &params).unwrap();
    world.add_component(e, NeuralNetComponent::new(vec![brain]));
    world.add_component(
        e,
        InputComponent {
            inputs: vec![vec![1.0; 2]],
        },
    );
    world.add_component(e, OutputComponent::default());

    let mut system = NeuralNetSystem::new();
    system.pre_execute(&world);
    system.execute(&world);

    assert_eq!(world.get_component::<OutputComponent>(e).unwrap().outputs, vec![vec![0.0]]);
}

#[test]
fn test_step_path_is_four_connected() {
    let path = step_path(GridPos::new(0, 0), GridPos::new(2, -1));
    assert_eq!(path, vec![GridPos::new(1, 0), GridPos::new(2, 0), GridPos::new(2, -1)]);
    assert!(step_path(GridPos::new(3, 3), GridPos::new(3, 3)).is_empty());
}

#[test]
fn test_path_system_resolves_pending_requests() {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component(
        e,
        PathRequestComponent {
            from: GridPos::new(1, 1),
            to: GridPos::new(1, 4),
            pending: true,
        },
    );
    world.add_component(e, PathResultComponent::default());

    let mut systems = Systems::new();
    systems.register(Box::new(PathSystem::new()));
    systems.run(&world);

    let result = world.get_component::<PathResultComponent>(e).unwrap().clone();
    assert!(result.ready);
    assert_eq!(result.path.last(), Some(&GridPos::new(1, 4)));
    assert_eq!(result.path.len(), 3);
    assert!(!world.get_component::<PathRequestComponent>(e).unwrap().pending);
}
