use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{QLearnerError, Result};
use crate::layers::DenseLayer;
use crate::loss::{Loss, LossKind};
use crate::optimizer::{GradientClipper, Optimizer};

/// Weights and biases of one dense layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// A detached snapshot of every parameter of a [`QNetwork`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NetworkParameters {
    pub layers: Vec<LayerParameters>,
}

impl NetworkParameters {
    /// Layer sizes implied by the weight shapes, input size first.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        if let Some(first) = self.layers.first() {
            sizes.push(first.weights.nrows());
        }
        sizes.extend(self.layers.iter().map(|l| l.weights.ncols()));
        sizes
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len() + l.biases.len()).sum()
    }

    /// Iterate every scalar parameter in a fixed order (layer by layer, weights then biases).
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.layers.iter().flat_map(|l| l.weights.iter().chain(l.biases.iter()))
    }
}

/// How a single gradient step on the online estimator is taken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateRule {
    pub loss: LossKind,
    pub clipper: GradientClipper,
    pub learning_rate: f32,
}

/// A mapping from observations to one value estimate per discrete action,
/// trainable on the estimate of the action that was actually taken.
pub trait ActionValueEstimator {
    /// Estimates for a single observation.
    fn q_values(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>>;

    /// Estimates for a batch of observations, one row per observation.
    fn q_values_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Take one gradient step moving `estimate(states[i])[actions[i]]` toward
    /// `targets[i]`. Returns the loss measured before the step.
    ///
    /// Shapes are validated before any parameter is touched.
    fn fit_selected<O: Optimizer>(
        &mut self,
        states: ArrayView2<f32>,
        actions: &[usize],
        targets: ArrayView1<f32>,
        rule: &UpdateRule,
        optimizer: &mut O,
    ) -> Result<f32>;

    /// `self ← tau * source + (1 - tau) * self`, parameter by parameter.
    fn soft_update_from(&mut self, source: &Self, tau: f32) -> Result<()>;
}

/// Feed-forward action-value network: dense layers with a configurable hidden
/// activation and a linear output layer.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QNetwork {
    pub layers: Vec<DenseLayer>,
}

impl QNetwork {
    /// Create a network for `layer_sizes` (observation size first, action count last).
    pub fn new<R: Rng + ?Sized>(layer_sizes: &[usize], hidden_activation: Activation, rng: &mut R) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(QLearnerError::invalid_parameter(
                "layer_sizes",
                "network needs at least an input and an output size",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(QLearnerError::invalid_parameter("layer_sizes", "layer sizes must be non-zero"));
        }

        let last = layer_sizes.len() - 2;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, window)| {
                let activation = if i == last { Activation::Linear } else { hidden_activation };
                DenseLayer::new(window[0], window[1], activation, &mut *rng)
            })
            .collect();

        Ok(QNetwork { layers })
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|l| l.output_size()));
        sizes
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_size())
    }

    /// Forward pass for a single observation. Does not touch any state.
    pub fn predict(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        if input.len() != self.input_size() {
            return Err(QLearnerError::observation_length(self.input_size(), input.len()));
        }
        let output = self.predict_batch(input.insert_axis(Axis(0)))?;
        Ok(output.row(0).to_owned())
    }

    /// Forward pass for a batch of observations. Does not touch any state.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(QLearnerError::dimension_mismatch(
                format!("batch with {} columns", self.input_size()),
                format!("{} columns", inputs.ncols()),
            ));
        }
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward_batch(current.view());
        }
        Ok(current)
    }

    fn forward_train(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_train(current.view());
        }
        current
    }

    fn backward(&self, output_errors: Array2<f32>) -> Option<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors;

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Some(gradients)
    }

    fn clear_caches(&mut self) {
        for layer in &mut self.layers {
            layer.clear_cache();
        }
    }

    pub fn parameters(&self) -> NetworkParameters {
        NetworkParameters {
            layers: self
                .layers
                .iter()
                .map(|l| LayerParameters { weights: l.weights.clone(), biases: l.biases.clone() })
                .collect(),
        }
    }

    /// Replace every parameter. The snapshot must match this network's layer shapes.
    pub fn set_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        let shapes_match = parameters.layers.len() == self.layers.len()
            && parameters
                .layers
                .iter()
                .zip(&self.layers)
                .all(|(p, l)| p.weights.dim() == l.weights.dim() && p.biases.len() == l.biases.len());
        if !shapes_match {
            return Err(QLearnerError::dimension_mismatch(
                format!("layer sizes {:?}", self.layer_sizes()),
                format!("{:?}", parameters.layer_sizes()),
            ));
        }

        for (layer, params) in self.layers.iter_mut().zip(&parameters.layers) {
            layer.weights.assign(&params.weights);
            layer.biases.assign(&params.biases);
            layer.clear_cache();
        }
        Ok(())
    }
}

impl ActionValueEstimator for QNetwork {
    fn q_values(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.predict(observation)
    }

    fn q_values_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.predict_batch(observations)
    }

    fn fit_selected<O: Optimizer>(
        &mut self,
        states: ArrayView2<f32>,
        actions: &[usize],
        targets: ArrayView1<f32>,
        rule: &UpdateRule,
        optimizer: &mut O,
    ) -> Result<f32> {
        let batch_size = states.nrows();
        if states.ncols() != self.input_size() {
            return Err(QLearnerError::observation_length(self.input_size(), states.ncols()));
        }
        if actions.len() != batch_size || targets.len() != batch_size {
            return Err(QLearnerError::dimension_mismatch(
                format!("{} actions and targets", batch_size),
                format!("{} actions, {} targets", actions.len(), targets.len()),
            ));
        }
        let action_size = self.output_size();
        if let Some(&action) = actions.iter().find(|&&a| a >= action_size) {
            return Err(QLearnerError::InvalidAction { action, action_size });
        }

        let outputs = self.forward_train(states);
        let selected = Array1::from_iter(actions.iter().enumerate().map(|(i, &a)| outputs[[i, a]]));
        let loss = rule.loss.compute(selected.view(), targets);
        let selected_gradient = rule.loss.gradient(selected.view(), targets);

        // only the taken action's output receives error
        let mut output_errors = Array2::zeros(outputs.dim());
        for (i, &a) in actions.iter().enumerate() {
            output_errors[[i, a]] = selected_gradient[i];
        }

        let gradients = self.backward(output_errors);
        self.clear_caches();
        let mut gradients = gradients.ok_or_else(|| {
            QLearnerError::dimension_mismatch("cached forward pass for every layer", "missing cache")
        })?;

        rule.clipper.clip(&mut gradients);
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            optimizer.update_weights(index, &mut layer.weights, &weight_gradients, rule.learning_rate);
            optimizer.update_biases(index, &mut layer.biases, &bias_gradients, rule.learning_rate);
        }
        optimizer.finish_step();

        Ok(loss)
    }

    fn soft_update_from(&mut self, source: &Self, tau: f32) -> Result<()> {
        if self.layer_sizes() != source.layer_sizes() {
            return Err(QLearnerError::dimension_mismatch(
                format!("layer sizes {:?}", self.layer_sizes()),
                format!("{:?}", source.layer_sizes()),
            ));
        }
        for (target, online) in self.layers.iter_mut().zip(&source.layers) {
            Zip::from(&mut target.weights)
                .and(&online.weights)
                .for_each(|t, &o| *t = tau * o + (1.0 - tau) * *t);
            Zip::from(&mut target.biases)
                .and(&online.biases)
                .for_each(|t, &o| *t = tau * o + (1.0 - tau) * *t);
        }
        Ok(())
    }
}
