use ndarray::ArrayView1;
use std::path::Path;

use crate::error::Result;

/// The contract a training driver needs from an agent.
pub trait LearningAgent {
    /// Length of the observations the agent accepts
    fn observation_size(&self) -> usize;

    /// Number of discrete actions
    fn action_size(&self) -> usize;

    /// Choose an action for `observation`, exploring with probability `epsilon`.
    fn select_action(&mut self, observation: ArrayView1<f32>, epsilon: f32) -> Result<usize>;

    /// Store one transition. May run a learning step; returns its loss if so.
    fn record_experience(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayView1<f32>,
        done: bool,
    ) -> Result<Option<f32>>;

    /// Persist whatever is needed to reproduce the agent's greedy behavior.
    fn save_checkpoint(&self, path: &Path) -> Result<()>;
}
