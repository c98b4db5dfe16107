pub mod test_replay_buffer;
