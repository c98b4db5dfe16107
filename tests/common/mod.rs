use ndarray::Array1;
use qlearner::error::{QLearnerError, Result};
use qlearner::training::{Environment, StepOutcome};

/// A one-dimensional corridor. The agent starts in the leftmost cell and the
/// episode ends with reward 1 when it reaches the rightmost cell. Every other
/// step costs 0.01. Observations are one-hot positions.
pub struct Corridor {
    pub length: usize,
    position: usize,
}

impl Corridor {
    pub fn new(length: usize) -> Self {
        Corridor { length, position: 0 }
    }

    fn observation(&self) -> Array1<f32> {
        let mut obs = Array1::zeros(self.length);
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for Corridor {
    fn observation_size(&self) -> usize {
        self.length
    }

    fn action_size(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Result<Array1<f32>> {
        self.position = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome> {
        match action {
            0 => self.position = self.position.saturating_sub(1),
            1 => self.position = (self.position + 1).min(self.length - 1),
            _ => return Err(QLearnerError::InvalidAction { action, action_size: 2 }),
        }
        let done = self.position == self.length - 1;
        let reward = if done { 1.0 } else { -0.01 };
        Ok(StepOutcome { observation: self.observation(), reward, done })
    }
}
