use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::activations::Activation;

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// He/Kaiming uniform initialization (for rectifiers)
    HeUniform,
}

impl WeightInit {
    /// Draw a `(fan_in, fan_out)` weight matrix from `rng`.
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;
        let limit = match *self {
            WeightInit::XavierUniform => (6.0 / (fan_in + fan_out) as f32).sqrt(),
            WeightInit::HeUniform => (6.0 / fan_in as f32).sqrt(),
        };
        Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
    }

    /// Biases always start at zero.
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }

    /// Get the recommended initialization for an activation function
    pub fn for_activation(activation: &Activation) -> Self {
        if activation.is_rectifier() {
            WeightInit::HeUniform
        } else {
            WeightInit::XavierUniform
        }
    }
}
