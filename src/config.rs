use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::activations::Activation;
use crate::error::{QLearnerError, Result};
use crate::loss::LossKind;
use crate::optimizer::OptimizerKind;

/// Everything an agent is constructed from. Fixed for the lifetime of the agent.
///
/// Missing fields fall back to [`AgentConfig::default`] when deserializing, so
/// a JSON file only needs to name what it changes:
///
/// ```rust
/// use qlearner::config::AgentConfig;
///
/// let config: AgentConfig = serde_json::from_str(r#"{"state_size": 37, "action_size": 4}"#).unwrap();
/// assert_eq!(config.batch_size, 64);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Length of every observation
    pub state_size: usize,
    /// Number of discrete actions
    pub action_size: usize,
    /// Seed for weight initialization, exploration and replay sampling
    pub seed: u64,
    pub buffer_capacity: usize,
    pub batch_size: usize,
    /// Learn once every this many recorded experiences
    pub update_every: usize,
    /// Discount factor, in (0, 1]
    pub gamma: f32,
    /// Soft-update fraction, in (0, 1]
    pub tau: f32,
    pub learning_rate: f32,
    /// Widths of the hidden layers
    pub hidden_layers: Vec<usize>,
    /// Activation used by the hidden layers
    pub activation: Activation,
    pub loss: LossKind,
    pub optimizer: OptimizerKind,
    /// Global gradient-norm limit; `None` disables clipping
    pub max_grad_norm: Option<f32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_size: 37,
            action_size: 4,
            seed: 0,
            buffer_capacity: 100_000,
            batch_size: 64,
            update_every: 4,
            gamma: 0.99,
            tau: 1e-3,
            learning_rate: 5e-4,
            hidden_layers: vec![64, 64],
            activation: Activation::Relu,
            loss: LossKind::Mse,
            optimizer: OptimizerKind::default(),
            max_grad_norm: None,
        }
    }
}

impl AgentConfig {
    pub fn new(state_size: usize, action_size: usize, seed: u64) -> Self {
        AgentConfig { state_size, action_size, seed, ..Self::default() }
    }

    /// Full layer sizes of the estimator, observation size first.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(self.state_size);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(self.action_size);
        sizes
    }

    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("state_size", self.state_size),
            ("action_size", self.action_size),
            ("buffer_capacity", self.buffer_capacity),
            ("batch_size", self.batch_size),
            ("update_every", self.update_every),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(QLearnerError::invalid_parameter(name, "must be greater than 0"));
            }
        }
        if self.hidden_layers.iter().any(|&w| w == 0) {
            return Err(QLearnerError::invalid_parameter("hidden_layers", "widths must be greater than 0"));
        }
        if self.batch_size > self.buffer_capacity {
            return Err(QLearnerError::invalid_parameter(
                "batch_size",
                "must not exceed buffer_capacity",
            ));
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(QLearnerError::invalid_parameter("gamma", "must lie in (0, 1]"));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(QLearnerError::invalid_parameter("tau", "must lie in (0, 1]"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(QLearnerError::invalid_parameter("learning_rate", "must be positive and finite"));
        }
        if let Some(norm) = self.max_grad_norm {
            if !(norm > 0.0) {
                return Err(QLearnerError::invalid_parameter("max_grad_norm", "must be positive"));
            }
        }
        if let LossKind::Huber { delta } = self.loss {
            if !(delta > 0.0) {
                return Err(QLearnerError::invalid_parameter("loss", "huber delta must be positive"));
            }
        }
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
