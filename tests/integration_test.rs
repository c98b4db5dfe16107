mod common;

use common::Corridor;
use ndarray::array;
use qlearner::agent::DqnAgent;
use qlearner::config::AgentConfig;
use qlearner::error::QLearnerError;
use qlearner::optimizer::OptimizerKind;
use qlearner::training::{evaluate, train, EpsilonSchedule, TrainingConfig};

fn corridor_config(length: usize) -> AgentConfig {
    AgentConfig {
        buffer_capacity: 2000,
        batch_size: 16,
        update_every: 1,
        gamma: 0.9,
        tau: 0.05,
        learning_rate: 1e-2,
        hidden_layers: vec![32],
        ..AgentConfig::new(length, 2, 3)
    }
}

#[test]
fn test_end_to_end_training_solves_corridor() {
    let mut env = Corridor::new(5);
    let mut agent = DqnAgent::new(corridor_config(5)).unwrap();
    let config = TrainingConfig {
        n_episodes: 200,
        max_t: 30,
        epsilon: EpsilonSchedule::new(1.0, 0.01, 0.95),
        // above the best possible score of 0.97, so every episode runs
        goal_score: 1.0,
        score_window: 10,
        checkpoint_path: None,
    };

    let report = train(&mut agent, &mut env, &config).unwrap();
    assert_eq!(report.episodes_run, 200);
    assert_eq!(report.solved_at, None);
    assert_eq!(report.scores.len(), report.episodes_run);
    assert_eq!(report.average_scores.len(), report.episodes_run);
    assert!(agent.learn_count() > 0);

    let scores = evaluate(&mut agent, &mut env, 3, 30).unwrap();
    for score in scores {
        // four steps right: three step costs then the goal
        assert!((score - 0.97).abs() < 1e-4, "greedy policy did not walk straight: {}", score);
    }
}

#[test]
fn test_training_stops_when_solved_and_writes_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.bin");
    let mut env = Corridor::new(3);
    let mut agent = DqnAgent::new(corridor_config(3)).unwrap();
    // any episode in a 3-cell corridor scores above -1
    let config = TrainingConfig {
        n_episodes: 50,
        max_t: 50,
        goal_score: -1.0,
        score_window: 5,
        checkpoint_path: Some(path.clone()),
        ..TrainingConfig::default()
    };

    let report = train(&mut agent, &mut env, &config).unwrap();
    assert_eq!(report.episodes_run, 1);
    assert_eq!(report.solved_at, Some(0));
    assert!(path.exists());

    let mut restored = DqnAgent::new(AgentConfig { seed: 99, ..corridor_config(3) }).unwrap();
    restored.load_checkpoint(&path).unwrap();
    assert_eq!(restored.online_parameters(), agent.online_parameters());
}

#[test]
fn test_goal_counts_before_window_fills() {
    let mut env = Corridor::new(3);
    let mut agent = DqnAgent::new(corridor_config(3)).unwrap();
    let config = TrainingConfig {
        n_episodes: 10,
        max_t: 50,
        goal_score: -1.0,
        score_window: 100,
        checkpoint_path: None,
        ..TrainingConfig::default()
    };

    let report = train(&mut agent, &mut env, &config).unwrap();
    assert_eq!(report.episodes_run, 1);
    assert_eq!(report.solved_at, Some(0));
    assert_eq!(report.average_scores, report.scores);
    assert!(report.average_scores[0] >= -1.0);
}

#[test]
fn test_epsilon_decays_once_per_episode() {
    let mut env = Corridor::new(3);
    let mut agent = DqnAgent::new(corridor_config(3)).unwrap();
    let config = TrainingConfig {
        n_episodes: 3,
        max_t: 10,
        epsilon: EpsilonSchedule::new(1.0, 0.1, 0.5),
        goal_score: 100.0,
        score_window: 100,
        checkpoint_path: None,
    };

    let report = train(&mut agent, &mut env, &config).unwrap();
    assert_eq!(report.episodes_run, 3);
    assert_eq!(report.solved_at, None);
    assert_eq!(report.final_epsilon, 0.125);
}

#[test]
fn test_mismatched_environment_rejected() {
    let mut env = Corridor::new(4);
    let mut agent = DqnAgent::new(corridor_config(5)).unwrap();
    let result = train(&mut agent, &mut env, &TrainingConfig::default());
    assert!(matches!(result, Err(QLearnerError::DimensionMismatch { .. })));
}

#[test]
fn test_checkpoint_round_trip_reproduces_actions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.ckpt");
    let config = AgentConfig {
        buffer_capacity: 100,
        batch_size: 4,
        update_every: 2,
        optimizer: OptimizerKind::Sgd,
        ..AgentConfig::new(4, 3, 1)
    };

    let mut agent = DqnAgent::new(config.clone()).unwrap();
    for i in 0..40 {
        let t = i as f32;
        let state = array![t.sin(), t.cos(), 0.1 * t, 1.0];
        let next_state = array![(t + 1.0).sin(), (t + 1.0).cos(), 0.1 * (t + 1.0), 1.0];
        agent.record_experience(state.view(), i % 3, (i % 5) as f32 - 2.0, next_state.view(), i % 10 == 9).unwrap();
    }
    agent.save_checkpoint(&path).unwrap();

    let mut restored = DqnAgent::new(AgentConfig { seed: 1234, ..config }).unwrap();
    restored.load_checkpoint(&path).unwrap();

    for i in 0..25 {
        let t = i as f32 * 0.37;
        let obs = array![t, -t, t * t, 0.5];
        assert_eq!(agent.select_action(obs.view(), 0.0).unwrap(), restored.select_action(obs.view(), 0.0).unwrap());
        assert_eq!(agent.q_values(obs.view()).unwrap(), restored.q_values(obs.view()).unwrap());
    }
}

#[test]
fn test_checkpoint_from_other_architecture_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.ckpt");
    let wide = DqnAgent::new(AgentConfig { hidden_layers: vec![128], ..AgentConfig::new(4, 2, 0) }).unwrap();
    wide.save_checkpoint(&path).unwrap();

    let mut agent = DqnAgent::new(AgentConfig::new(4, 2, 0)).unwrap();
    let before = agent.online_parameters();
    let result = agent.load_checkpoint(&path);
    assert!(matches!(result, Err(QLearnerError::CheckpointFormat(_))));
    assert_eq!(agent.online_parameters(), before);

    std::fs::write(&path, b"not a checkpoint").unwrap();
    assert!(matches!(agent.load_checkpoint(&path), Err(QLearnerError::CheckpointFormat(_))));
}
