//! A single layer of sigmoid neurons.

use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::simulation::error::{Result, SimError};

/// A fully connected layer of sigmoid neurons.
///
/// Row `i` of `weights` is the weight vector of neuron `i`, so the matrix is
/// `neurons_count × inputs_count`. All neurons share the layer `bias` and the
/// sigmoid slope `p`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronLayer {
    /// Weight matrix (`neurons_count` × `inputs_count`).
    pub weights: Array2<f32>,
    /// Bias added to every neuron's weighted sum.
    pub bias: f32,
    /// Sigmoid slope. Larger values flatten the curve.
    pub p: f32,
}

impl NeuronLayer {
    /// Creates a layer with weights drawn uniformly from `[-1, 1]`.
    pub fn new_random(inputs_count: usize, neurons_count: usize, bias: f32, p: f32) -> Self {
        Self {
            weights: Array2::random((neurons_count, inputs_count), Uniform::new(-1.0, 1.0)),
            bias,
            p,
        }
    }

    /// Number of inputs each neuron reads.
    pub fn inputs_count(&self) -> usize {
        self.weights.ncols()
    }

    /// Number of neurons, which is also the layer's output width.
    pub fn outputs_count(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of weights stored in this layer.
    pub fn weight_count(&self) -> usize {
        self.weights.len()
    }

    /// Performs the forward pass: `sigmoid(w · x + bias)` per neuron.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = self.weights.dot(inputs);
        let p = self.p;
        let bias = self.bias;
        output.mapv_inplace(|a| sigmoid(a + bias, p));
        output
    }

    /// Copies this layer's weights, neuron by neuron, onto the end of `out`.
    pub fn write_weights(&self, out: &mut Vec<f32>) {
        out.extend(self.weights.iter().copied());
    }

    /// Overwrites this layer's weights from the front of `weights`.
    ///
    /// Returns the number of values consumed.
    pub fn read_weights(&mut self, weights: &[f32]) -> Result<usize> {
        let needed = self.weight_count();
        if weights.len() < needed {
            return Err(SimError::GenomeLength {
                expected: needed,
                got: weights.len(),
            });
        }
        for (w, &v) in self.weights.iter_mut().zip(&weights[..needed]) {
            *w = v;
        }
        Ok(needed)
    }
}

/// Logistic sigmoid with steepness parameter `p`.
#[inline]
pub fn sigmoid(a: f32, p: f32) -> f32 {
    1.0 / (1.0 + (-a / p).exp())
}
