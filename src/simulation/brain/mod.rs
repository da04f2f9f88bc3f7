//! Feed-forward neural networks used as agent brains.
//!
//! A [`Brain`] is an ordered chain of [`NeuronLayer`]s. Evaluation is a pure
//! function of the weights and the inputs, so brains can be evaluated from any
//! number of threads at once. Weights can be flattened into a genome and
//! written back, which is how the genetic algorithm reaches the networks.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub mod layer;

pub use layer::{NeuronLayer, sigmoid};

use super::agent::AgentType;
use super::error::{Result, SimError};

/// The role a brain plays for its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BrainType {
    /// Grid steering for herbivores and carnivores.
    Movement,
    /// Decides whether to eat the food under the agent.
    Eat,
    /// Decides whether to strike the nearest prey.
    Attack,
    /// Grid steering away from the nearest predator.
    Escape,
    /// Weights for the four flocking offsets.
    Flocking,
    /// Turn forces for free-moving scavengers.
    ScavengerMovement,
}

impl BrainType {
    /// Lower-case name used for file paths and logs.
    pub fn name(self) -> &'static str {
        match self {
            BrainType::Movement => "movement",
            BrainType::Eat => "eat",
            BrainType::Attack => "attack",
            BrainType::Escape => "escape",
            BrainType::Flocking => "flocking",
            BrainType::ScavengerMovement => "scavenger_movement",
        }
    }
}

/// A feed-forward network with a role and an owner type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brain {
    /// Role of this network.
    pub brain_type: BrainType,
    /// Agent type that owns this network.
    pub agent_type: AgentType,
    /// Ordered layers from input to output.
    layers: Vec<NeuronLayer>,
}

impl Brain {
    /// Creates a brain with no layers.
    pub fn new(brain_type: BrainType, agent_type: AgentType) -> Self {
        Self {
            brain_type,
            agent_type,
            layers: Vec::new(),
        }
    }

    /// Builds a randomly initialized brain from its layer widths.
    ///
    /// `layer_sizes` lists the input width followed by every layer's neuron
    /// count, so `[4, 6, 2]` creates a hidden layer of 6 and an output layer
    /// of 2.
    pub fn with_topology(
        brain_type: BrainType,
        agent_type: AgentType,
        layer_sizes: &[usize],
        bias: f32,
        p: f32,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 || layer_sizes.contains(&0) {
            return Err(SimError::Config(format!(
                "brain topology {layer_sizes:?} needs an input width and at least one non-empty layer"
            )));
        }
        let mut brain = Self::new(brain_type, agent_type);
        for pair in layer_sizes.windows(2) {
            brain.add_layer(NeuronLayer::new_random(pair[0], pair[1], bias, p))?;
        }
        Ok(brain)
    }

    /// Appends a layer if its input width matches the current output width.
    pub fn add_layer(&mut self, layer: NeuronLayer) -> Result<()> {
        if let Some(last) = self.layers.last() {
            if last.outputs_count() != layer.inputs_count() {
                return Err(SimError::LayerWidth {
                    expected: last.outputs_count(),
                    got: layer.inputs_count(),
                });
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// The layers of this brain, input side first.
    pub fn layers(&self) -> &[NeuronLayer] {
        &self.layers
    }

    /// Input width of the first layer, or 0 for an empty brain.
    pub fn inputs_count(&self) -> usize {
        self.layers.first().map_or(0, NeuronLayer::inputs_count)
    }

    /// Output width of the last layer, or 0 for an empty brain.
    pub fn outputs_count(&self) -> usize {
        self.layers.last().map_or(0, NeuronLayer::outputs_count)
    }

    /// Total number of weights, which is the genome length for this brain.
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(NeuronLayer::weight_count).sum()
    }

    /// Runs a forward pass through all layers.
    #[inline]
    pub fn think(&self, inputs: &[f32]) -> Result<Array1<f32>> {
        if inputs.len() != self.inputs_count() {
            return Err(SimError::InputWidth {
                expected: self.inputs_count(),
                got: inputs.len(),
            });
        }
        let mut output = Array1::from_vec(inputs.to_vec());
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        Ok(output)
    }

    /// Flattens all weights, layer by layer and neuron by neuron.
    pub fn weights(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.weight_count());
        for layer in &self.layers {
            layer.write_weights(&mut flat);
        }
        flat
    }

    /// Writes a flat weight vector back in the order produced by [`Brain::weights`].
    pub fn set_weights(&mut self, weights: &[f32]) -> Result<()> {
        let expected = self.weight_count();
        if weights.len() != expected {
            return Err(SimError::GenomeLength {
                expected,
                got: weights.len(),
            });
        }
        let mut offset = 0;
        for layer in &mut self.layers {
            offset += layer.read_weights(&weights[offset..])?;
        }
        Ok(())
    }
}
