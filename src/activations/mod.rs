//! # Activation Functions
//!
//! Non-linearities applied between the dense layers of the action-value network.
//! Hidden layers use the configured activation; the output layer is always
//! [`Activation::Linear`] because action values are unbounded.
//!
//! ```rust
//! use qlearner::activations::Activation;
//! use ndarray::array;
//!
//! let mut batch = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply_batch(&mut batch);
//! assert_eq!(batch, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
