//! Corridor Example
//!
//! Trains a DQN agent to walk to the far end of a one-dimensional corridor,
//! saves a checkpoint once solved, then reloads it into a fresh agent and plays
//! a few greedy episodes.
//!
//! Run with `cargo run --example corridor`; set `RUST_LOG=qlearner=debug` to
//! see every episode and learning step.

use ndarray::Array1;
use qlearner::agent::DqnAgent;
use qlearner::config::AgentConfig;
use qlearner::error::{QLearnerError, Result};
use qlearner::training::{evaluate, train, EpsilonSchedule, Environment, StepOutcome, TrainingConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LENGTH: usize = 8;

/// Start at the left wall; reaching the right wall pays 1, every other step costs 0.01.
struct Corridor {
    position: usize,
}

impl Corridor {
    fn observation(&self) -> Array1<f32> {
        let mut obs = Array1::zeros(LENGTH);
        obs[self.position] = 1.0;
        obs
    }
}

impl Environment for Corridor {
    fn observation_size(&self) -> usize {
        LENGTH
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
            1 => self.position = (self.position + 1).min(LENGTH - 1),
            _ => return Err(QLearnerError::InvalidAction { action, action_size: 2 }),
        }
        let done = self.position == LENGTH - 1;
        Ok(StepOutcome {
            observation: self.observation(),
            reward: if done { 1.0 } else { -0.01 },
            done,
        })
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let agent_config = AgentConfig {
        buffer_capacity: 10_000,
        batch_size: 32,
        update_every: 4,
        gamma: 0.95,
        tau: 0.01,
        learning_rate: 1e-3,
        hidden_layers: vec![32, 32],
        ..AgentConfig::new(LENGTH, 2, 0)
    };
    let checkpoint = std::env::temp_dir().join("qlearner-corridor.ckpt");
    let training_config = TrainingConfig {
        n_episodes: 500,
        max_t: 100,
        epsilon: EpsilonSchedule::new(1.0, 0.01, 0.98),
        // only the straight walk (seven steps, 0.94) clears this
        goal_score: 0.93,
        score_window: 20,
        checkpoint_path: Some(checkpoint.clone()),
    };

    let mut env = Corridor { position: 0 };
    let mut agent = DqnAgent::new(agent_config.clone())?;
    let report = train(&mut agent, &mut env, &training_config)?;
    match report.solved_at {
        Some(episode) => info!(episode, episodes_run = report.episodes_run, "solved"),
        None => info!(episodes_run = report.episodes_run, "not solved within the episode budget"),
    }
    info!(report = %serde_json::to_string(&report)?, "training report");

    if checkpoint.exists() {
        let mut restored = DqnAgent::new(agent_config)?;
        restored.load_checkpoint(&checkpoint)?;
        let scores = evaluate(&mut restored, &mut env, 3, 50)?;
        info!(?scores, "greedy play with restored agent");
    }
    Ok(())
}
