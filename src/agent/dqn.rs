use ndarray::{Array1, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use tracing::{debug, trace};

use crate::activations::Activation;
use crate::checkpoint::Checkpoint;
use crate::config::AgentConfig;
use crate::error::{QLearnerError, Result};
use crate::loss::LossKind;
use crate::network::{ActionValueEstimator, NetworkParameters, QNetwork, UpdateRule};
use crate::optimizer::{GradientClipper, OptimizerKind, OptimizerWrapper};
use crate::replay_buffer::{Experience, ExperienceBatch, ReplayBuffer};
use super::traits::LearningAgent;

/// Deep Q-Network agent with experience replay and a soft-updated target network.
///
/// All randomness (weight initialization, exploration, replay sampling) comes
/// from one `StdRng` seeded from [`AgentConfig::seed`], so two agents built from
/// the same config and fed the same calls behave identically.
///
/// # Example
///
/// ```rust
/// use qlearner::agent::DqnAgent;
/// use qlearner::config::AgentConfig;
/// use ndarray::array;
///
/// let config = AgentConfig {
///     buffer_capacity: 5,
///     batch_size: 2,
///     update_every: 2,
///     tau: 0.01,
///     ..AgentConfig::new(4, 2, 0)
/// };
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// for step in 0..4 {
///     let state = array![step as f32, 0.0, 0.0, 0.0];
///     let next_state = array![step as f32 + 1.0, 0.0, 0.0, 0.0];
///     agent.record_experience(state.view(), step % 2, 1.0, next_state.view(), false).unwrap();
/// }
/// assert_eq!(agent.learn_count(), 2);
/// assert_eq!(agent.memory().len(), 4);
/// ```
pub struct DqnAgent {
    config: AgentConfig,

    /// Network used for action selection and trained by gradient descent
    online: QNetwork,

    /// Network used only for bootstrap targets, moved by soft updates
    target: QNetwork,

    optimizer: OptimizerWrapper,
    update_rule: UpdateRule,
    memory: ReplayBuffer,
    rng: StdRng,

    /// Number of `record_experience` calls
    step_count: usize,

    /// Number of completed learning steps
    learn_count: usize,
}

impl DqnAgent {
    /// Create an agent from a validated configuration.
    ///
    /// The target network starts as an exact copy of the online network.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let online = QNetwork::new(&config.layer_sizes(), config.activation, &mut rng)?;
        let target = online.clone();
        let optimizer = OptimizerWrapper::from_kind(config.optimizer, &online.layers);
        let update_rule = UpdateRule {
            loss: config.loss,
            clipper: GradientClipper::from_max_norm(config.max_grad_norm),
            learning_rate: config.learning_rate,
        };
        let memory = ReplayBuffer::new(config.buffer_capacity);

        debug!(
            layer_sizes = ?online.layer_sizes(),
            buffer_capacity = config.buffer_capacity,
            seed = config.seed,
            "created dqn agent"
        );

        Ok(DqnAgent {
            config,
            online,
            target,
            optimizer,
            update_rule,
            memory,
            rng,
            step_count: 0,
            learn_count: 0,
        })
    }

    fn check_observation(&self, observation: ArrayView1<f32>) -> Result<()> {
        if observation.len() != self.config.state_size {
            return Err(QLearnerError::observation_length(self.config.state_size, observation.len()));
        }
        Ok(())
    }

    /// Online estimates for `observation`.
    pub fn q_values(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        self.check_observation(observation)?;
        self.online.q_values(observation)
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability `epsilon` (clamped to `[0, 1]`) a uniformly random action
    /// is returned; otherwise the action with the highest online estimate, ties
    /// going to the lowest index. Network parameters are never modified.
    pub fn select_action(&mut self, observation: ArrayView1<f32>, epsilon: f32) -> Result<usize> {
        self.check_observation(observation)?;
        let epsilon = epsilon.clamp(0.0, 1.0);

        if self.rng.gen::<f32>() < epsilon {
            let action = self.rng.gen_range(0..self.config.action_size);
            trace!(action, epsilon, "exploring");
            Ok(action)
        } else {
            let q_values = self.online.q_values(observation)?;
            let action = greedy_action(q_values.view());
            trace!(action, epsilon, "exploiting");
            Ok(action)
        }
    }

    /// Store a transition and, on the learning cadence, run one learning step.
    ///
    /// Every `update_every`-th call triggers [`DqnAgent::learn`] provided the
    /// buffer holds at least `batch_size` experiences. Returns the loss of that
    /// step, if one ran. Inputs are validated before anything is stored.
    pub fn record_experience(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<Option<f32>> {
        self.check_observation(state)?;
        self.check_observation(next_state)?;
        if action >= self.config.action_size {
            return Err(QLearnerError::InvalidAction { action, action_size: self.config.action_size });
        }

        self.memory.record(Experience::new(state.to_owned(), action, reward, next_state.to_owned(), done));
        self.step_count += 1;

        if self.step_count % self.config.update_every == 0 && self.memory.len() >= self.config.batch_size {
            return self.learn().map(Some);
        }
        Ok(None)
    }

    /// Sample a batch, take one gradient step on the online network toward the
    /// TD targets, then soft-update the target network. Returns the loss
    /// measured before the step.
    ///
    /// Normally driven by [`DqnAgent::record_experience`]. Fails with
    /// `InsufficientData` and changes nothing when fewer than `batch_size`
    /// experiences are stored.
    pub fn learn(&mut self) -> Result<f32> {
        let batch = {
            let sampled = self.memory.sample(self.config.batch_size, &mut self.rng)?;
            ExperienceBatch::from_experiences(&sampled)?
        };

        let targets = self.td_targets(&batch)?;
        let loss = self.online.fit_selected(
            batch.states.view(),
            &batch.actions,
            targets.view(),
            &self.update_rule,
            &mut self.optimizer,
        )?;
        self.target.soft_update_from(&self.online, self.config.tau)?;
        self.learn_count += 1;

        debug!(loss, learn_count = self.learn_count, step_count = self.step_count, "learning step");
        Ok(loss)
    }

    /// `reward + gamma * max_a target(next_state)[a]`, or just `reward` for terminal steps.
    fn td_targets(&self, batch: &ExperienceBatch) -> Result<Array1<f32>> {
        let next_q = self.target.q_values_batch(batch.next_states.view())?;
        let gamma = self.config.gamma;

        Ok(Array1::from_iter(next_q.axis_iter(Axis(0)).enumerate().map(|(i, row)| {
            if batch.dones[i] {
                batch.rewards[i]
            } else {
                let max_next = row.iter().fold(f32::NEG_INFINITY, |max, &v| max.max(v));
                batch.rewards[i] + gamma * max_next
            }
        })))
    }

    /// TD targets the next learning step would use for `experiences`.
    pub fn compute_td_targets(&self, experiences: &[&Experience]) -> Result<Array1<f32>> {
        let batch = ExperienceBatch::from_experiences(experiences)?;
        if batch.states.ncols() != self.config.state_size {
            return Err(QLearnerError::observation_length(self.config.state_size, batch.states.ncols()));
        }
        self.td_targets(&batch)
    }

    /// Snapshot of the online network's parameters.
    pub fn online_parameters(&self) -> NetworkParameters {
        self.online.parameters()
    }

    /// Snapshot of the target network's parameters.
    pub fn target_parameters(&self) -> NetworkParameters {
        self.target.parameters()
    }

    /// Restore the online network from externally supplied parameters.
    ///
    /// The target network is reset to the same values. On a shape mismatch a
    /// `CheckpointFormat` error is returned and neither network changes.
    pub fn load_online_parameters(&mut self, parameters: &NetworkParameters) -> Result<()> {
        let expected = self.online.layer_sizes();
        let actual = parameters.layer_sizes();
        if expected != actual {
            return Err(QLearnerError::CheckpointFormat(format!(
                "parameters for layer sizes {:?} cannot be loaded into network {:?}",
                actual, expected
            )));
        }
        self.online
            .set_parameters(parameters)
            .map_err(|e| QLearnerError::CheckpointFormat(e.to_string()))?;
        self.target
            .set_parameters(parameters)
            .map_err(|e| QLearnerError::CheckpointFormat(e.to_string()))?;
        Ok(())
    }

    /// Write the online network's parameters to `path`.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Checkpoint::new(self.online_parameters()).save(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "saved checkpoint");
        Ok(())
    }

    /// Restore the online network from a checkpoint written by [`DqnAgent::save_checkpoint`].
    pub fn load_checkpoint<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let checkpoint = Checkpoint::load(path.as_ref())?;
        checkpoint.check_compatible(&self.online.layer_sizes())?;
        self.load_online_parameters(&checkpoint.parameters)?;
        debug!(path = %path.as_ref().display(), "loaded checkpoint");
        Ok(())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn online_network(&self) -> &QNetwork {
        &self.online
    }

    pub fn target_network(&self) -> &QNetwork {
        &self.target
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn learn_count(&self) -> usize {
        self.learn_count
    }
}

/// Index of the largest estimate; the lowest index wins ties.
fn greedy_action(q_values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &q) in q_values.iter().enumerate().skip(1) {
        if q > q_values[best] {
            best = i;
        }
    }
    best
}

impl LearningAgent for DqnAgent {
    fn observation_size(&self) -> usize {
        self.config.state_size
    }

    fn action_size(&self) -> usize {
        self.config.action_size
    }

    fn select_action(&mut self, observation: ArrayView1<f32>, epsilon: f32) -> Result<usize> {
        DqnAgent::select_action(self, observation, epsilon)
    }

    fn record_experience(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<Option<f32>> {
        DqnAgent::record_experience(self, state, action, reward, next_state, done)
    }

    fn save_checkpoint(&self, path: &Path) -> Result<()> {
        DqnAgent::save_checkpoint(self, path)
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    config: AgentConfig,
}

impl DqnAgentBuilder {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        DqnAgentBuilder { config: AgentConfig::new(state_size, action_size, 0) }
    }

    pub fn from_config(config: AgentConfig) -> Self {
        DqnAgentBuilder { config }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn update_every(mut self, steps: usize) -> Self {
        self.config.update_every = steps;
        self
    }

    pub fn gamma(mut self, gamma: f32) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn tau(mut self, tau: f32) -> Self {
        self.config.tau = tau;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    pub fn hidden_layers(mut self, widths: &[usize]) -> Self {
        self.config.hidden_layers = widths.to_vec();
        self
    }

    pub fn activation(mut self, activation: Activation) -> Self {
        self.config.activation = activation;
        self
    }

    pub fn loss(mut self, loss: LossKind) -> Self {
        self.config.loss = loss;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    pub fn max_grad_norm(mut self, max_norm: f32) -> Self {
        self.config.max_grad_norm = Some(max_norm);
        self
    }

    pub fn build(self) -> Result<DqnAgent> {
        DqnAgent::new(self.config)
    }
}
