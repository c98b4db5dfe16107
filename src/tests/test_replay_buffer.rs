use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

use crate::error::QLearnerError;
use crate::replay_buffer::{Experience, ExperienceBatch, ReplayBuffer};

fn experience(i: usize) -> Experience {
    Experience::new(array![i as f32], i % 2, i as f32, array![(i + 1) as f32], false)
}

#[test]
fn test_replay_buffer_record_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut replay_buffer = ReplayBuffer::new(10);
    replay_buffer.record(experience(0));
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1, &mut rng).unwrap();
    assert_eq!(sample[0], &experience(0));
}

#[test]
fn test_replay_buffer_evicts_oldest() {
    let mut buffer = ReplayBuffer::new(3);
    for i in 1..=4 {
        buffer.record(experience(i));
    }

    assert_eq!(buffer.len(), 3);
    let rewards: Vec<f32> = buffer.iter().map(|e| e.reward).collect();
    assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_replay_buffer_size_is_bounded() {
    let mut buffer = ReplayBuffer::new(5);
    for i in 0..20 {
        buffer.record(experience(i));
        assert_eq!(buffer.size(), (i + 1).min(5));
    }
    assert_eq!(buffer.capacity(), 5);
}

#[test]
fn test_sample_members_of_contents() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(4);
    for i in 0..10 {
        buffer.record(experience(i));
    }
    let contents: Vec<Experience> = buffer.iter().cloned().collect();

    for k in 1..=4 {
        let batch = buffer.sample(k, &mut rng).unwrap();
        assert_eq!(batch.len(), k);
        assert!(batch.iter().all(|e| contents.contains(e)));
        let distinct: HashSet<u32> = batch.iter().map(|e| e.reward.to_bits()).collect();
        assert_eq!(distinct.len(), k);
    }
}

#[test]
fn test_sample_before_enough_data_fails() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(10);
    assert!(buffer.is_empty());
    buffer.record(experience(0));

    let result = buffer.sample(2, &mut rng);
    assert_eq!(result.unwrap_err(), QLearnerError::InsufficientData { requested: 2, available: 1 });
}

#[test]
fn test_sample_does_not_mutate() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut buffer = ReplayBuffer::new(6);
    for i in 0..6 {
        buffer.record(experience(i));
    }
    let before: Vec<Experience> = buffer.iter().cloned().collect();
    for _ in 0..10 {
        buffer.sample(3, &mut rng).unwrap();
    }
    let after: Vec<Experience> = buffer.iter().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn test_sampling_covers_whole_buffer() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut buffer = ReplayBuffer::new(8);
    for i in 0..8 {
        buffer.record(experience(i));
    }
    let mut seen = HashSet::new();
    for _ in 0..200 {
        for e in buffer.sample(2, &mut rng).unwrap() {
            seen.insert(e.reward as usize);
        }
    }
    assert_eq!(seen.len(), 8);
}

#[test]
fn test_experience_batch_stacks_rows() {
    let a = experience(1);
    let b = Experience::new(array![7.0], 1, -1.0, array![8.0], true);
    let batch = ExperienceBatch::from_experiences(&[&a, &b]).unwrap();

    assert_eq!(batch.states, array![[1.0], [7.0]]);
    assert_eq!(batch.next_states, array![[2.0], [8.0]]);
    assert_eq!(batch.actions, vec![1, 1]);
    assert_eq!(batch.rewards, array![1.0, -1.0]);
    assert_eq!(batch.dones, vec![false, true]);
}

#[test]
fn test_experience_batch_rejects_ragged_states() {
    let a = experience(1);
    let b = Experience::new(array![7.0, 1.0], 0, 0.0, array![8.0, 1.0], false);
    assert!(matches!(
        ExperienceBatch::from_experiences(&[&a, &b]),
        Err(QLearnerError::DimensionMismatch { .. })
    ));
}
