//! # Learning Agent
//!
//! [`DqnAgent`] owns an online and a target action-value network together with
//! a replay buffer, and learns from its own experience:
//!
//! - **select_action**: epsilon-greedy over the online network's estimates
//! - **record_experience**: store a transition; every `update_every` steps, once
//!   the buffer holds a full batch, run one learning step
//! - **learn**: TD targets from the target network, one gradient step on the
//!   online network, then a soft update of the target toward the online network
//!
//! Epsilon is owned by the caller and passed into every `select_action` call.
//!
//! ```rust
//! use qlearner::agent::DqnAgentBuilder;
//! use ndarray::array;
//!
//! let mut agent = DqnAgentBuilder::new(4, 2)
//!     .seed(7)
//!     .buffer_capacity(100)
//!     .batch_size(2)
//!     .update_every(2)
//!     .build()
//!     .unwrap();
//!
//! let state = array![0.1, -0.2, 0.3, -0.1];
//! let action = agent.select_action(state.view(), 0.1).unwrap();
//! let next_state = array![0.15, -0.25, 0.35, -0.05];
//! agent.record_experience(state.view(), action, 1.0, next_state.view(), false).unwrap();
//! assert_eq!(agent.memory().len(), 1);
//! ```

pub mod traits;

mod dqn;
pub use dqn::{DqnAgent, DqnAgentBuilder};
pub use traits::LearningAgent;
