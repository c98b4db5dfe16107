use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// An enumeration of the activation functions a hidden layer can use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    LeakyRelu { alpha: f32 },
    Tanh,
    Linear,
}

impl Activation {
    /// Apply the activation function to a batch in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                inputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::LeakyRelu { alpha } => {
                let a = *alpha;
                inputs.mapv_inplace(|v| if v > 0.0 { v } else { a * v });
            }
            Activation::Tanh => {
                inputs.mapv_inplace(|v| v.tanh());
            }
            Activation::Linear => {}
        }
    }

    /// Derivative with respect to the pre-activation values of a batch.
    pub fn derivative_batch(&self, pre_activations: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => {
                pre_activations.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
            }
            Activation::LeakyRelu { alpha } => {
                let a = *alpha;
                pre_activations.mapv(|v| if v > 0.0 { 1.0 } else { a })
            }
            Activation::Tanh => {
                pre_activations.mapv(|v| {
                    let tanh_v = v.tanh();
                    1.0 - tanh_v * tanh_v
                })
            }
            Activation::Linear => Array2::ones(pre_activations.dim()),
        }
    }

    /// Whether the activation is rectifier-shaped (zero or near-zero for negative input).
    pub fn is_rectifier(&self) -> bool {
        matches!(self, Activation::Relu | Activation::LeakyRelu { .. })
    }
}
