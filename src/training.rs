//! # Training Driver
//!
//! Runs episodes of an [`Environment`] against a [`LearningAgent`], owns the
//! epsilon schedule and keeps score statistics. Training stops early once the
//! mean score over the last `score_window` episodes reaches `goal_score`. The
//! check runs after every episode, so a window that is not yet full counts.
//!
//! ```rust,no_run
//! use qlearner::agent::DqnAgent;
//! use qlearner::config::AgentConfig;
//! use qlearner::training::{train, Environment, TrainingConfig};
//! # fn env() -> Box<dyn Environment> { unimplemented!() }
//!
//! let mut env = env();
//! let mut agent = DqnAgent::new(AgentConfig::new(env.observation_size(), env.action_size(), 0)).unwrap();
//! let report = train(&mut agent, env.as_mut(), &TrainingConfig::default()).unwrap();
//! println!("solved at {:?}", report.solved_at);
//! ```

use ndarray::Array1;
use serde::{Serialize, Deserialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::agent::LearningAgent;
use crate::error::{QLearnerError, Result};

/// Result of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

/// An episodic environment with a discrete action set.
pub trait Environment {
    fn observation_size(&self) -> usize;

    fn action_size(&self) -> usize;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Array1<f32>>;

    fn step(&mut self, action: usize) -> Result<StepOutcome>;
}

/// Multiplicative per-episode epsilon decay with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    pub start: f32,
    pub end: f32,
    pub decay: f32,
    #[serde(skip)]
    current: Option<f32>,
}

impl EpsilonSchedule {
    pub fn new(start: f32, end: f32, decay: f32) -> Self {
        EpsilonSchedule { start, end, decay, current: None }
    }

    pub fn value(&self) -> f32 {
        self.current.unwrap_or(self.start)
    }

    /// Decay once: `eps = max(end, decay * eps)`.
    pub fn advance(&mut self) -> f32 {
        let next = (self.decay * self.value()).max(self.end);
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self::new(1.0, 0.01, 0.995)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Maximum number of training episodes
    pub n_episodes: usize,
    /// Maximum number of steps per episode
    pub max_t: usize,
    pub epsilon: EpsilonSchedule,
    /// Window mean at which the environment counts as solved
    pub goal_score: f32,
    /// Number of recent episodes averaged for the goal check
    pub score_window: usize,
    /// Where to write the online parameters once solved
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            n_episodes: 2000,
            max_t: 1000,
            epsilon: EpsilonSchedule::default(),
            goal_score: 13.0,
            score_window: 100,
            checkpoint_path: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.score_window == 0 {
            return Err(QLearnerError::invalid_parameter("score_window", "must be greater than 0"));
        }
        let eps = &self.epsilon;
        if !(0.0..=1.0).contains(&eps.start) || !(0.0..=1.0).contains(&eps.end) || eps.end > eps.start {
            return Err(QLearnerError::invalid_parameter("epsilon", "need 0 <= end <= start <= 1"));
        }
        if !(eps.decay > 0.0 && eps.decay <= 1.0) {
            return Err(QLearnerError::invalid_parameter("epsilon.decay", "must lie in (0, 1]"));
        }
        Ok(())
    }
}

/// Full score history plus a rolling window of the most recent scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreTracker {
    scores: Vec<f32>,
    average_scores: Vec<f32>,
    window: VecDeque<f32>,
    window_size: usize,
}

impl ScoreTracker {
    pub fn new(window_size: usize) -> Self {
        ScoreTracker {
            scores: Vec::new(),
            average_scores: Vec::new(),
            window: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Record an episode score and return the updated window mean.
    pub fn push(&mut self, score: f32) -> f32 {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(score);
        self.scores.push(score);
        let mean = self.window_mean();
        self.average_scores.push(mean);
        mean
    }

    pub fn window_mean(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f32>() / self.window.len() as f32
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn average_scores(&self) -> &[f32] {
        &self.average_scores
    }

    pub fn episodes(&self) -> usize {
        self.scores.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Score of every episode, in order
    pub scores: Vec<f32>,
    /// Window mean after every episode
    pub average_scores: Vec<f32>,
    /// Episode at which the solving window began, if the goal was reached
    pub solved_at: Option<usize>,
    pub episodes_run: usize,
    /// Epsilon after the last decay
    pub final_epsilon: f32,
}

fn check_environment<A: LearningAgent + ?Sized, E: Environment + ?Sized>(agent: &A, env: &E) -> Result<()> {
    if env.observation_size() != agent.observation_size() {
        return Err(QLearnerError::dimension_mismatch(
            format!("environment observations of length {}", agent.observation_size()),
            format!("length {}", env.observation_size()),
        ));
    }
    if env.action_size() != agent.action_size() {
        return Err(QLearnerError::dimension_mismatch(
            format!("{} actions", agent.action_size()),
            format!("{} actions", env.action_size()),
        ));
    }
    Ok(())
}

/// Run one episode; returns its score.
fn run_episode<A, E>(agent: &mut A, env: &mut E, max_t: usize, epsilon: f32, learn: bool) -> Result<f32>
where
    A: LearningAgent + ?Sized,
    E: Environment + ?Sized,
{
    let mut state = env.reset()?;
    let mut score = 0.0;

    for _ in 0..max_t {
        let action = agent.select_action(state.view(), epsilon)?;
        let StepOutcome { observation, reward, done } = env.step(action)?;
        if learn {
            agent.record_experience(state.view(), action, reward, observation.view(), done)?;
        }
        state = observation;
        score += reward;
        if done {
            break;
        }
    }
    Ok(score)
}

/// Train `agent` on `env` until solved or `n_episodes` have run.
pub fn train<A, E>(agent: &mut A, env: &mut E, config: &TrainingConfig) -> Result<TrainingReport>
where
    A: LearningAgent + ?Sized,
    E: Environment + ?Sized,
{
    config.validate()?;
    check_environment(agent, env)?;

    let mut tracker = ScoreTracker::new(config.score_window);
    let mut epsilon = config.epsilon;
    epsilon.reset();
    let mut solved_at = None;

    for episode in 1..=config.n_episodes {
        let score = run_episode(agent, env, config.max_t, epsilon.value(), true)?;
        let mean = tracker.push(score);
        epsilon.advance();

        debug!(episode, score, mean, epsilon = epsilon.value(), "episode finished");
        if episode % 100 == 0 {
            info!(episode, average_score = mean, "training progress");
        }

        if mean >= config.goal_score {
            let start = episode.saturating_sub(config.score_window);
            info!(episode = start, average_score = mean, "environment solved");
            if let Some(path) = &config.checkpoint_path {
                agent.save_checkpoint(path)?;
                info!(path = %path.display(), "checkpoint written");
            }
            solved_at = Some(start);
            break;
        }
    }

    Ok(TrainingReport {
        scores: tracker.scores().to_vec(),
        average_scores: tracker.average_scores().to_vec(),
        solved_at,
        episodes_run: tracker.episodes(),
        final_epsilon: epsilon.value(),
    })
}

/// Play `episodes` greedy episodes without recording experience; returns their scores.
pub fn evaluate<A, E>(agent: &mut A, env: &mut E, episodes: usize, max_t: usize) -> Result<Vec<f32>>
where
    A: LearningAgent + ?Sized,
    E: Environment + ?Sized,
{
    check_environment(agent, env)?;
    (0..episodes)
        .map(|episode| {
            let score = run_episode(agent, env, max_t, 0.0, false)?;
            info!(episode, score, "evaluation episode");
            Ok(score)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, ArrayView1};
    use std::path::Path;

    /// Always picks action 0 and never learns.
    struct FixedAgent;

    impl LearningAgent for FixedAgent {
        fn observation_size(&self) -> usize {
            1
        }

        fn action_size(&self) -> usize {
            1
        }

        fn select_action(&mut self, _observation: ArrayView1<f32>, _epsilon: f32) -> Result<usize> {
            Ok(0)
        }

        fn record_experience(
            &mut self,
            _state: ArrayView1<f32>,
            _action: usize,
            _reward: f32,
            _next_state: ArrayView1<f32>,
            _done: bool,
        ) -> Result<Option<f32>> {
            Ok(None)
        }

        fn save_checkpoint(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    /// One-step episodes; episode `n` (counting from 1) scores `n`.
    struct RisingScores {
        episode: usize,
    }

    impl Environment for RisingScores {
        fn observation_size(&self) -> usize {
            1
        }

        fn action_size(&self) -> usize {
            1
        }

        fn reset(&mut self) -> Result<Array1<f32>> {
            self.episode += 1;
            Ok(array![0.0])
        }

        fn step(&mut self, _action: usize) -> Result<StepOutcome> {
            Ok(StepOutcome { observation: array![0.0], reward: self.episode as f32, done: true })
        }
    }

    fn run(goal_score: f32, score_window: usize) -> TrainingReport {
        let config = TrainingConfig { n_episodes: 50, max_t: 5, goal_score, score_window, ..TrainingConfig::default() };
        train(&mut FixedAgent, &mut RisingScores { episode: 0 }, &config).unwrap()
    }

    #[test]
    fn test_goal_checked_before_window_is_full() {
        // means: 1, 1.5
        let report = run(1.5, 10);
        assert_eq!(report.episodes_run, 2);
        assert_eq!(report.solved_at, Some(0));
        assert_eq!(report.average_scores, vec![1.0, 1.5]);
    }

    #[test]
    fn test_solved_at_is_window_start() {
        // window of 3 over 1, 2, 3, ...: means 1, 1.5, 2, 3, 4, 5
        let report = run(5.0, 3);
        assert_eq!(report.episodes_run, 6);
        assert_eq!(report.solved_at, Some(3));
        assert_eq!(report.scores, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_unreached_goal_runs_every_episode() {
        let report = run(1000.0, 3);
        assert_eq!(report.episodes_run, 50);
        assert_eq!(report.solved_at, None);
    }

    #[test]
    fn test_epsilon_schedule_decays_to_floor() {
        let mut schedule = EpsilonSchedule::new(1.0, 0.1, 0.5);
        assert_eq!(schedule.value(), 1.0);
        assert_eq!(schedule.advance(), 0.5);
        assert_eq!(schedule.advance(), 0.25);
        assert_eq!(schedule.advance(), 0.125);
        assert_eq!(schedule.advance(), 0.1);
        assert_eq!(schedule.advance(), 0.1);
        schedule.reset();
        assert_eq!(schedule.value(), 1.0);
    }

    #[test]
    fn test_score_tracker_window() {
        let mut tracker = ScoreTracker::new(2);
        assert_eq!(tracker.push(1.0), 1.0);
        assert_eq!(tracker.push(3.0), 2.0);
        assert_eq!(tracker.push(5.0), 4.0);
        assert_eq!(tracker.scores(), &[1.0, 3.0, 5.0]);
        assert_eq!(tracker.average_scores(), &[1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_training_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        let bad = TrainingConfig { score_window: 0, ..TrainingConfig::default() };
        assert!(bad.validate().is_err());
        let inverted = TrainingConfig {
            epsilon: EpsilonSchedule::new(0.1, 0.5, 0.9),
            ..TrainingConfig::default()
        };
        assert!(inverted.validate().is_err());
    }
}
