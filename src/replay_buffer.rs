use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;

use crate::error::{QLearnerError, Result};

/// One recorded environment step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Experience {
    pub fn new(state: Array1<f32>, action: usize, reward: f32, next_state: Array1<f32>, done: bool) -> Self {
        Experience { state, action, reward, next_state, done }
    }
}

/// Bounded FIFO store of experiences with uniform mini-batch sampling.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an experience, evicting the oldest one when full.
    pub fn record(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Draw `batch_size` experiences uniformly at random.
    ///
    /// Indices are distinct within one batch; separate calls are independent
    /// draws. The buffer itself is never modified.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Experience>> {
        if self.buffer.len() < batch_size {
            return Err(QLearnerError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        Ok(index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Alias of [`ReplayBuffer::len`].
    pub fn size(&self) -> usize {
        self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored experiences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }
}

/// A sampled mini-batch stacked into arrays, one row per experience.
#[derive(Clone, Debug)]
pub struct ExperienceBatch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    pub dones: Vec<bool>,
}

impl ExperienceBatch {
    pub fn from_experiences(experiences: &[&Experience]) -> Result<Self> {
        let batch_size = experiences.len();
        let state_size = experiences.first().map_or(0, |e| e.state.len());

        let mut states = Array2::zeros((batch_size, state_size));
        let mut next_states = Array2::zeros((batch_size, state_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Vec::with_capacity(batch_size);

        for (i, exp) in experiences.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(QLearnerError::observation_length(
                    state_size,
                    if exp.state.len() != state_size { exp.state.len() } else { exp.next_state.len() },
                ));
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
            actions.push(exp.action);
            rewards[i] = exp.reward;
            dones.push(exp.done);
        }

        Ok(ExperienceBatch { states, actions, rewards, next_states, dones })
    }
}
