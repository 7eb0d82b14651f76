use crate::activation::Activation;
use crate::math::weighted_sum;

/// One tier of nodes plus the weighted edges into the next tier. The last
/// layer of a network owns no outgoing edges, so its `size_out` stays zero.
#[derive(Clone, Debug)]
pub struct Layer {
    pub size_in: usize,
    pub size_out: usize,
    /// Activations of this layer, length `size_in`.
    pub nodes: Vec<f32>,
    /// Pre-activation sums feeding this layer, length `size_in`. Empty on
    /// layer 0, which receives its nodes directly.
    pub weighted_sum: Vec<f32>,
    /// `weights[k][n]` weighs the edge from node `n` here to node `k` of the
    /// next layer. `size_out` rows of `size_in` columns.
    pub weights: Vec<Vec<f32>>,
    /// One bias per next-layer node, length `size_out`.
    pub biases: Vec<f32>,
    pub delta_weights: Vec<Vec<f32>>,
    pub delta_biases: Vec<f32>,
    /// Error accumulated against this layer's activations, scattered back
    /// from the layer above during backpropagation.
    pub delta_nodes: Vec<f32>,
}

impl Layer {
    pub fn new(size: usize) -> Self {
        Self {
            size_in: size,
            size_out: 0,
            nodes: vec![0.0; size],
            weighted_sum: Vec::new(),
            weights: Vec::new(),
            biases: Vec::new(),
            delta_weights: Vec::new(),
            delta_biases: Vec::new(),
            delta_nodes: Vec::new(),
        }
    }

    /// Fills the next layer's weighted sums and activations from this
    /// layer's nodes and outgoing parameters.
    pub(crate) fn forward_into(&self, next: &mut Layer, activation: Activation) {
        for k in 0..self.size_out {
            next.weighted_sum[k] = weighted_sum(&self.nodes, &self.weights[k]) + self.biases[k];
            next.nodes[k] = activation.apply(next.weighted_sum[k]);
        }
    }

    /// Accumulates the error term of next-layer node `k` into this layer's
    /// gradient buffers. Weight and bias deltas average over the mini-batch;
    /// node deltas average over the next layer's fan of `size_out` edges.
    pub(crate) fn accumulate(&mut self, k: usize, term: f32, batch_size: f32) {
        let fan = self.size_out as f32;
        for n in 0..self.size_in {
            self.delta_weights[k][n] += self.nodes[n] * term / batch_size;
            self.delta_nodes[n] += self.weights[k][n] * term / fan;
        }
        self.delta_biases[k] += term / batch_size;
    }

    /// Steps the outgoing weights and biases against their accumulated
    /// deltas and zeroes every accumulator.
    pub(crate) fn apply_deltas(&mut self, learn_rate: f32) {
        for k in 0..self.size_out {
            for n in 0..self.size_in {
                self.weights[k][n] -= self.delta_weights[k][n] * learn_rate;
                self.delta_weights[k][n] = 0.0;
            }
            self.biases[k] -= self.delta_biases[k] * learn_rate;
            self.delta_biases[k] = 0.0;
        }
        for delta in &mut self.delta_nodes {
            *delta = 0.0;
        }
    }
}
