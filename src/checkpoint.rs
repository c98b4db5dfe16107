//! Binary checkpoints of the online estimator's parameters.
//!
//! A checkpoint records the layer sizes next to the parameters so that a
//! mismatched artifact is rejected before anything is overwritten.

use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::error::{QLearnerError, Result};
use crate::network::NetworkParameters;

const MAGIC: [u8; 4] = *b"QLRN";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Checkpoint {
    magic: [u8; 4],
    pub version: u32,
    pub layer_sizes: Vec<usize>,
    pub parameters: NetworkParameters,
}

impl Checkpoint {
    pub fn new(parameters: NetworkParameters) -> Self {
        Checkpoint {
            magic: MAGIC,
            version: FORMAT_VERSION,
            layer_sizes: parameters.layer_sizes(),
            parameters,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and check a checkpoint. Every failure is a `CheckpointFormat` error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let checkpoint: Checkpoint = bincode::deserialize(bytes)
            .map_err(|e| QLearnerError::CheckpointFormat(format!("undecodable artifact: {}", e)))?;
        if checkpoint.magic != MAGIC {
            return Err(QLearnerError::CheckpointFormat("not a qlearner checkpoint".to_string()));
        }
        if checkpoint.version != FORMAT_VERSION {
            return Err(QLearnerError::CheckpointFormat(format!(
                "unsupported version {} (expected {})",
                checkpoint.version, FORMAT_VERSION
            )));
        }
        if checkpoint.layer_sizes != checkpoint.parameters.layer_sizes() {
            return Err(QLearnerError::CheckpointFormat(
                "recorded layer sizes disagree with stored parameters".to_string(),
            ));
        }
        Ok(checkpoint)
    }

    /// Fail unless this checkpoint fits a network with `layer_sizes`.
    pub fn check_compatible(&self, layer_sizes: &[usize]) -> Result<()> {
        if self.layer_sizes != layer_sizes {
            return Err(QLearnerError::CheckpointFormat(format!(
                "layer sizes {:?} do not match network {:?}",
                self.layer_sizes, layer_sizes
            )));
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }
}
