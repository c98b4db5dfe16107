#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use qlearner::activations::Activation;
    use qlearner::agent::DqnAgent;
    use qlearner::config::AgentConfig;
    use qlearner::network::{ActionValueEstimator, QNetwork};
    use qlearner::replay_buffer::{Experience, ReplayBuffer};
    use ndarray::{array, Array1};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn experience(i: usize) -> Experience {
        Experience::new(array![i as f32], 0, i as f32, array![i as f32 + 1.0], false)
    }

    // Strategy for generating finite observations
    fn observation_strategy(size: usize) -> impl Strategy<Value = Array1<f32>> {
        prop::collection::vec(-10.0f32..10.0, size).prop_map(Array1::from_vec)
    }

    proptest! {
        #[test]
        fn test_buffer_keeps_most_recent(capacity in 1usize..20, inserts in 0usize..60) {
            let mut buffer = ReplayBuffer::new(capacity);
            for i in 0..inserts {
                buffer.record(experience(i));
            }

            let kept = inserts.min(capacity);
            prop_assert_eq!(buffer.len(), kept);
            let rewards: Vec<usize> = buffer.iter().map(|e| e.reward as usize).collect();
            let expected: Vec<usize> = (inserts - kept..inserts).collect();
            prop_assert_eq!(rewards, expected);
        }

        #[test]
        fn test_sample_size_and_membership(len in 1usize..30, k in 1usize..30, seed in any::<u64>()) {
            let mut buffer = ReplayBuffer::new(len);
            for i in 0..len {
                buffer.record(experience(i));
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let result = buffer.sample(k, &mut rng);
            if k <= len {
                let batch = result.unwrap();
                prop_assert_eq!(batch.len(), k);
                prop_assert!(batch.iter().all(|e| (e.reward as usize) < len));
            } else {
                prop_assert!(result.is_err());
            }
        }

        #[test]
        fn test_soft_update_stays_between(tau in 0.001f32..=1.0, seed_a in any::<u64>(), seed_b in any::<u64>()) {
            let mut target = QNetwork::new(&[3, 6, 2], Activation::Relu, &mut StdRng::seed_from_u64(seed_a)).unwrap();
            let online = QNetwork::new(&[3, 6, 2], Activation::Relu, &mut StdRng::seed_from_u64(seed_b)).unwrap();
            let old = target.parameters();

            target.soft_update_from(&online, tau).unwrap();
            let new = target.parameters();
            let src = online.parameters();

            for ((n, o), s) in new.iter().zip(old.iter()).zip(src.iter()) {
                let lo = o.min(*s) - 1e-6;
                let hi = o.max(*s) + 1e-6;
                prop_assert!(*n >= lo && *n <= hi, "{} outside [{}, {}]", n, lo, hi);
            }
        }

        #[test]
        fn test_greedy_action_is_stable(obs in observation_strategy(4), seed in any::<u64>()) {
            let mut agent = DqnAgent::new(AgentConfig {
                hidden_layers: vec![8],
                buffer_capacity: 10,
                batch_size: 2,
                ..AgentConfig::new(4, 3, seed)
            }).unwrap();
            let before = agent.online_parameters();

            let first = agent.select_action(obs.view(), 0.0).unwrap();
            prop_assert!(first < 3);
            prop_assert_eq!(agent.select_action(obs.view(), 0.0).unwrap(), first);
            prop_assert_eq!(agent.online_parameters(), before);
        }
    }
}
