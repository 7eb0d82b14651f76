use std::fmt;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use tracing::{debug, trace, trace_span, warn};

use crate::activation::Activation;
use crate::cost::CostFn;
use crate::layer::Layer;
use crate::math::normalize;

/// Fresh weights and biases are drawn uniformly from this symmetric range.
const INIT_RANGE: f32 = 10.0;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkError {
    /// The network cannot perform the requested operation in its current
    /// configuration.
    InvalidConfiguration(&'static str),
    /// A supplied vector does not line up with the layer it feeds.
    ShapeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(reason) => write!(f, "invalid configuration: {reason}"),
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "shape mismatch: expected a vector of length {expected}, got {actual}"
            ),
        }
    }
}

impl std::error::Error for NetworkError {}

/// A feedforward network trained by plain gradient descent. Layers are added
/// input to output, then `build` sizes the parameter and gradient storage
/// from the layer list. Gradients accumulate across `train` calls until
/// `apply_deltas` commits them, which is what makes mini-batches work.
#[derive(Clone, Debug)]
pub struct Network {
    pub layers: Vec<Layer>,
    pub learn_rate: f32,
    pub input_min: f32,
    pub input_max: f32,
    /// Targets are rescaled from `[target_min, target_max]` into the
    /// activation range before training, and outputs back out of it.
    pub target_min: f32,
    pub target_max: f32,
    activation_min: f32,
    activation_max: f32,
    cost_fn: CostFn,
    activation: Activation,
    target_vector: Vec<f32>,
    built: bool,
}

impl Network {
    pub fn new() -> Self {
        let activation = Activation::Sigmoid;
        let (activation_min, activation_max) = activation.range();
        Self {
            layers: Vec::new(),
            learn_rate: 0.01,
            input_min: 0.0,
            input_max: 1.0,
            target_min: 0.0,
            target_max: 1.0,
            activation_min,
            activation_max,
            cost_fn: CostFn::Mse,
            activation,
            target_vector: Vec::new(),
            built: false,
        }
    }

    /// Appends a layer of `size` nodes. Once the network is built, the
    /// architecture is fixed and further layers are ignored.
    pub fn add_layer(&mut self, size: usize) {
        if self.built {
            warn!(size, "Ignoring a layer added after build.");
            return;
        }
        self.layers.push(Layer::new(size));
    }

    pub fn set_cost_fn(&mut self, cost_fn: CostFn) {
        self.cost_fn = cost_fn;
    }

    /// Sets the activation function and adopts its output range.
    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
        let (min, max) = activation.range();
        self.activation_min = min;
        self.activation_max = max;
    }

    /// Node count of the input layer.
    pub fn input_len(&self) -> usize {
        self.layers.first().map(|layer| layer.size_in).unwrap_or(0)
    }

    /// Node count of the output layer.
    pub fn output_len(&self) -> usize {
        self.layers.last().map(|layer| layer.size_in).unwrap_or(0)
    }

    /// Sizes every weight matrix, bias vector, and gradient buffer from the
    /// layer list. Requires at least an input and an output layer, and runs
    /// exactly once.
    pub fn build(&mut self) -> Result<(), NetworkError> {
        if self.built {
            return Err(NetworkError::InvalidConfiguration(
                "the network is already built",
            ));
        }
        if self.layers.len() < 2 {
            return Err(NetworkError::InvalidConfiguration(
                "a network requires an input layer and an output layer",
            ));
        }

        for i in 0..self.layers.len() - 1 {
            let size_out = self.layers[i + 1].size_in;
            let layer = &mut self.layers[i];
            layer.size_out = size_out;
            layer.biases = vec![0.0; size_out];
            layer.delta_biases = vec![0.0; size_out];
            layer.weights = vec![vec![0.0; layer.size_in]; size_out];
            layer.delta_weights = vec![vec![0.0; layer.size_in]; size_out];
        }
        for layer in self.layers.iter_mut() {
            layer.delta_nodes = vec![0.0; layer.size_in];
        }
        for layer in self.layers.iter_mut().skip(1) {
            layer.weighted_sum = vec![0.0; layer.size_in];
        }
        self.target_vector = vec![0.0; self.output_len()];
        self.built = true;

        let sizes: Vec<usize> = self.layers.iter().map(|layer| layer.size_in).collect();
        debug!(?sizes, "Built network.");
        Ok(())
    }

    /// Draws every bias and weight from a uniform distribution over
    /// `[-INIT_RANGE, INIT_RANGE]`. The draw order is fixed, so a seeded
    /// generator reinitializes a given architecture reproducibly.
    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        let range = Uniform::new(-INIT_RANGE, INIT_RANGE);
        for layer in &mut self.layers {
            for bias in &mut layer.biases {
                *bias = range.sample(rng);
            }
            for row in &mut layer.weights {
                for weight in row {
                    *weight = range.sample(rng);
                }
            }
        }
    }

    /// The weight row a coupled generator reads while backpropagating
    /// through this network's verdict: row 0 of the first weight matrix, one
    /// weight per input node. `None` until the network is built.
    pub fn coupling_weights(&self) -> Option<&[f32]> {
        self.layers
            .first()
            .and_then(|layer| layer.weights.first())
            .map(Vec::as_slice)
    }

    /// Runs a forward pass over `inputs` and returns the output activations
    /// rescaled from the activation range into the target range.
    pub fn generate(&mut self, inputs: &[f32]) -> Result<Vec<f32>, NetworkError> {
        self.load_inputs(inputs)?;
        self.forward_propagate();

        let output = &self.layers[self.layers.len() - 1];
        Ok(output
            .nodes
            .iter()
            .map(|&node| {
                normalize(
                    node,
                    self.activation_min,
                    self.activation_max,
                    self.target_min,
                    self.target_max,
                )
            })
            .collect())
    }

    /// Trains on one sample: loads `inputs`, rescales `target` into the
    /// activation range, propagates forward, accumulates gradients as one
    /// mini-batch share, and returns the cost of the output against the
    /// rescaled target. Weights stay untouched until `apply_deltas`.
    ///
    /// `is_real` feeds the cost function; the log losses score real and
    /// generated samples differently. A coupled generator passes the
    /// discriminator's `coupling_weights` as `gan_link` to train through the
    /// discriminator's verdict.
    pub fn train(
        &mut self,
        inputs: &[f32],
        target: &[f32],
        batch_size: usize,
        is_real: bool,
        gan_link: Option<&[f32]>,
    ) -> Result<f32, NetworkError> {
        let _span = trace_span!("Network::train", batch_size, is_real).entered();

        self.check_batch(target, batch_size, gan_link)?;
        self.load_inputs(inputs)?;

        let (target_min, target_max) = (self.target_min, self.target_max);
        let (activation_min, activation_max) = (self.activation_min, self.activation_max);
        for (slot, &value) in self.target_vector.iter_mut().zip(target) {
            *slot = normalize(value, target_min, target_max, activation_min, activation_max);
        }

        self.forward_propagate();
        self.back_propagate_inner(batch_size as f32, is_real, gan_link);

        let output = &self.layers[self.layers.len() - 1].nodes;
        let cost = self.cost_fn.value(output, &self.target_vector, is_real);
        trace!(cost, "Trained one sample.");
        Ok(cost)
    }

    /// Accumulates gradients against a target already expressed in the
    /// activation range, using whatever activations the last forward pass
    /// left in the layers. `train` composes this with the forward pass and
    /// target rescale.
    pub fn back_propagate(
        &mut self,
        target: &[f32],
        batch_size: usize,
        is_real: bool,
        gan_link: Option<&[f32]>,
    ) -> Result<(), NetworkError> {
        self.check_batch(target, batch_size, gan_link)?;
        self.target_vector.copy_from_slice(target);
        self.back_propagate_inner(batch_size as f32, is_real, gan_link);
        Ok(())
    }

    /// Steps every weight and bias against its accumulated delta and zeroes
    /// all accumulators. Run this once per mini-batch; the deltas already
    /// average over the batch size handed to `train`.
    pub fn apply_deltas(&mut self) {
        let learn_rate = self.learn_rate;
        for layer in &mut self.layers {
            layer.apply_deltas(learn_rate);
        }
    }

    fn load_inputs(&mut self, inputs: &[f32]) -> Result<(), NetworkError> {
        if !self.built {
            return Err(NetworkError::InvalidConfiguration(
                "the network is not built",
            ));
        }
        if inputs.len() != self.input_len() {
            return Err(NetworkError::ShapeMismatch {
                expected: self.input_len(),
                actual: inputs.len(),
            });
        }
        self.layers[0].nodes.copy_from_slice(inputs);
        Ok(())
    }

    fn check_batch(
        &self,
        target: &[f32],
        batch_size: usize,
        gan_link: Option<&[f32]>,
    ) -> Result<(), NetworkError> {
        if !self.built {
            return Err(NetworkError::InvalidConfiguration(
                "the network is not built",
            ));
        }
        if batch_size == 0 {
            return Err(NetworkError::InvalidConfiguration(
                "the batch size must be at least 1",
            ));
        }
        if target.len() != self.output_len() {
            return Err(NetworkError::ShapeMismatch {
                expected: self.output_len(),
                actual: target.len(),
            });
        }
        if let Some(link) = gan_link {
            if link.len() != self.output_len() {
                return Err(NetworkError::ShapeMismatch {
                    expected: self.output_len(),
                    actual: link.len(),
                });
            }
        }
        Ok(())
    }

    fn forward_propagate(&mut self) {
        let activation = self.activation;
        for i in 0..self.layers.len() - 1 {
            let (front, back) = self.layers.split_at_mut(i + 1);
            front[i].forward_into(&mut back[0], activation);
        }
    }

    fn back_propagate_inner(&mut self, batch_size: f32, is_real: bool, gan_link: Option<&[f32]>) {
        let cost_fn = self.cost_fn;
        let activation = self.activation;
        let last = self.layers.len() - 1;

        // The output layer draws its error from the cost derivative. In
        // linked mode the derivative reads the discriminator's verdict from
        // slot 0 of the target vector and routes through its weight row.
        let (front, back) = self.layers.split_at_mut(last);
        let prev = &mut front[last - 1];
        let output = &back[0];
        for k in 0..output.size_in {
            let term = match gan_link {
                Some(link) => {
                    link[k]
                        * activation.derivative(output.weighted_sum[k])
                        * cost_fn.derivative(self.target_vector[0], output.nodes[k], is_real)
                }
                None => {
                    activation.derivative(output.weighted_sum[k])
                        * cost_fn.derivative(self.target_vector[k], output.nodes[k], is_real)
                }
            };
            prev.accumulate(k, term, batch_size);
        }

        // A two-layer network has no hidden tiers to walk back through.
        if last == 1 {
            return;
        }

        for i in (1..last).rev() {
            let (front, back) = self.layers.split_at_mut(i);
            let prev = &mut front[i - 1];
            let layer = &mut back[0];
            for k in 0..layer.size_in {
                let term = activation.derivative(layer.weighted_sum[k]) * layer.delta_nodes[k];
                prev.accumulate(k, term, batch_size);
                layer.delta_nodes[k] = 0.0;
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
