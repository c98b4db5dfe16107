use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use super::initialization::WeightInit;

/// A fully connected (dense) layer of the action-value network.
///
/// `forward_batch` is pure and is what action selection and target evaluation
/// use. `forward_train` additionally caches the inputs and pre-activations that
/// `backward_batch` needs.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer, drawing its weights from `rng` with the
    /// initialization recommended for `activation`.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        let init = WeightInit::for_activation(&activation);
        DenseLayer {
            weights: init.initialize_weights((input_size, output_size), rng),
            biases: init.initialize_biases(output_size),
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Self {
        assert_eq!(weights.dim(), self.weights.dim());
        self.weights = weights;
        self
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Self {
        assert_eq!(biases.dim(), self.biases.dim());
        self.biases = biases;
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn pre_activation(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Forward pass for a batch without touching the training cache.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.pre_activation(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Forward pass that records what `backward_batch` needs.
    pub fn forward_train(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.pre_activation(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    /// Gradients for this layer given the error at its outputs.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`, or `None`
    /// when `forward_train` has not been called since the last `clear_cache`.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Option<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let pre_activation_output = self.pre_activation_output.as_ref()?;
        let inputs = self.inputs.as_ref()?;

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Some((adjusted_error, weight_gradients, bias_gradients))
    }

    pub fn clear_cache(&mut self) {
        self.inputs = None;
        self.pre_activation_output = None;
    }
}
