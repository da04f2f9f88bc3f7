#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use evo_swarm::simulation::agent::{AgentType, brain_shape, build_brain};
use evo_swarm::simulation::brain::{Brain, BrainType, NeuronLayer, sigmoid};
use evo_swarm::simulation::error::SimError;
use evo_swarm::simulation::params::Params;
use ndarray::{Array1, Array2};

fn fixed_layer(weights: Vec<f32>, neurons: usize, inputs: usize) -> NeuronLayer {
    NeuronLayer {
        weights: Array2::from_shape_vec((neurons, inputs), weights).unwrap(),
        bias: 0.0,
        p: 1.0,
    }
}

#[test]
fn test_sigmoid_midpoint_and_slope() {
    assert_eq!(sigmoid(0.0, 1.0), 0.5);
    assert!(sigmoid(10.0, 1.0) > 0.99);
    assert!(sigmoid(-10.0, 1.0) < 0.01);
    // A larger p flattens the curve.
    assert!(sigmoid(1.0, 5.0) < sigmoid(1.0, 0.5));
}

#[test]
fn test_forward_matches_hand_computation() {
    let layer = NeuronLayer {
        weights: Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.5, -0.5]).unwrap(),
        bias: 0.25,
        p: 0.5,
    };
    let out = layer.forward(&Array1::from_vec(vec![1.0, 2.0]));
    assert_eq!(out.len(), 2);
    assert!((out[0] - sigmoid(1.25, 0.5)).abs() < 1e-6);
    assert!((out[1] - sigmoid(-0.25, 0.5)).abs() < 1e-6);
}

#[test]
fn test_output_length_equals_last_layer() {
    let brain = Brain::with_topology(
        BrainType::Movement,
        AgentType::Herbivore,
        &[6, 8, 5, 2],
        1.0,
        0.5,
    )
    .unwrap();
    let out = brain.think(&[0.1; 6]).unwrap();
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_add_layer_rejects_width_mismatch() {
    let mut brain = Brain::new(BrainType::Eat, AgentType::Herbivore);
    brain.add_layer(NeuronLayer::new_random(4, 3, 1.0, 1.0)).unwrap();

    let err = brain.add_layer(NeuronLayer::new_random(5, 1, 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, SimError::LayerWidth { expected: 3, got: 5 }));
    assert_eq!(brain.layers().len(), 1);
}

#[test]
fn test_think_rejects_wrong_input_width() {
    let brain = Brain::with_topology(
        BrainType::Eat,
        AgentType::Herbivore,
        &[4, 1],
        1.0,
        1.0,
    )
    .unwrap();
    let err = brain.think(&[0.0; 3]).unwrap_err();
    assert!(matches!(err, SimError::InputWidth { expected: 4, got: 3 }));
}

#[test]
fn test_weights_round_trip_preserves_outputs() {
    let source = Brain::with_topology(
        BrainType::Movement,
        AgentType::Carnivore,
        &[6, 4, 2],
        1.0,
        0.5,
    )
    .unwrap();
    let mut copy = Brain::with_topology(
        BrainType::Movement,
        AgentType::Carnivore,
        &[6, 4, 2],
        1.0,
        0.5,
    )
    .unwrap();

    copy.set_weights(&source.weights()).unwrap();

    let inputs = [0.3, -0.2, 0.9, 0.0, 1.0, 0.5];
    assert_eq!(source.think(&inputs).unwrap(), copy.think(&inputs).unwrap());
    assert_eq!(source.weights(), copy.weights());
}

#[test]
fn test_weights_are_row_major_in_layer_order() {
    let mut brain = Brain::new(BrainType::Eat, AgentType::Herbivore);
    brain.add_layer(fixed_layer(vec![1.0, 2.0, 3.0, 4.0], 2, 2)).unwrap();
    brain.add_layer(fixed_layer(vec![5.0, 6.0], 1, 2)).unwrap();

    assert_eq!(brain.weight_count(), 6);
    assert_eq!(brain.weights(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_set_weights_rejects_wrong_length() {
    let mut brain = Brain::with_topology(
        BrainType::Eat,
        AgentType::Herbivore,
        &[4, 1],
        1.0,
        1.0,
    )
    .unwrap();
    let before = brain.weights();

    let err = brain.set_weights(&[0.0; 3]).unwrap_err();
    assert!(matches!(err, SimError::GenomeLength { expected: 4, got: 3 }));
    assert_eq!(brain.weights(), before);
}

#[test]
fn test_species_brain_shapes() {
    let params = Params::default();
    for agent_type in AgentType::ALL {
        for &brain_type in agent_type.brain_set() {
            let (inputs, outputs) = brain_shape(agent_type, brain_type).unwrap();
            let brain = build_brain(agent_type, brain_type, &params).unwrap();
            assert_eq!(brain.inputs_count(), inputs);
            assert_eq!(brain.outputs_count(), outputs);
            assert_eq!(brain.layers().len(), params.hidden_layers.len() + 1);
        }
    }
}

#[test]
fn test_brain_outside_species_set_is_rejected() {
    let err = build_brain(AgentType::Scavenger, BrainType::Attack, &Params::default()).unwrap_err();
    assert!(matches!(
        err,
        SimError::InvalidBrain {
            agent: AgentType::Scavenger,
            brain: BrainType::Attack
        }
    ));
}
