//! # qlearner - Deep Q-Learning for Discrete-Action Environments
//!
//! qlearner trains an agent to pick discrete actions in an episodic environment
//! by approximating the action-value function with a small feed-forward
//! network, learning from replayed experience.
//!
//! ## Key Pieces
//!
//! - **Replay memory**: bounded FIFO buffer with uniform mini-batch sampling
//! - **Online and target networks**: the online network is trained by gradient
//!   descent; the target network supplies bootstrap values and tracks the online
//!   one through soft updates
//! - **Epsilon-greedy exploration** driven by an explicit, seeded random source
//! - **Checkpoints** of the online parameters for evaluation without training
//!
//! ## Quick Start
//!
//! ```rust
//! use qlearner::agent::DqnAgent;
//! use qlearner::config::AgentConfig;
//! use ndarray::array;
//!
//! let mut agent = DqnAgent::new(AgentConfig::new(4, 2, 0)).unwrap();
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.select_action(state.view(), 1.0).unwrap();
//! assert!(action < 2);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Hidden-layer activation functions
//! - [`agent`] - The DQN learning agent
//! - [`checkpoint`] - Binary checkpoints of network parameters
//! - [`config`] - Agent configuration
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense layers and weight initialization
//! - [`loss`] - Regression losses for the TD update
//! - [`network`] - The action-value network and its training interface
//! - [`optimizer`] - SGD, Adam and gradient clipping
//! - [`replay_buffer`] - Experience replay
//! - [`training`] - Episode loop, epsilon schedule and score tracking

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod training;

pub use error::{QLearnerError, Result};

#[cfg(test)]
mod tests;
