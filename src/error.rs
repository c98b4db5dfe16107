use std::fmt;

/// Result type for qlearner operations
pub type Result<T> = std::result::Result<T, QLearnerError>;

/// Main error type for the qlearner library
#[derive(Debug, Clone, PartialEq)]
pub enum QLearnerError {
    /// Sampling or learning attempted before enough experience was recorded
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Observation or batch of unexpected shape
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Checkpoint artifact incompatible with the receiving network
    CheckpointFormat(String),

    /// Invalid configuration value
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Action index outside the action set
    InvalidAction {
        action: usize,
        action_size: usize,
    },

    /// IO errors (file operations)
    Io(String),

    /// Serialization/deserialization errors
    Serialization(String),
}

impl fmt::Display for QLearnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QLearnerError::InsufficientData { requested, available } => {
                write!(f, "Insufficient data: requested {} transitions, {} stored", requested, available)
            }
            QLearnerError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            QLearnerError::CheckpointFormat(msg) => write!(f, "Checkpoint format error: {}", msg),
            QLearnerError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            QLearnerError::InvalidAction { action, action_size } => {
                write!(f, "Invalid action {}: must be less than {}", action, action_size)
            }
            QLearnerError::Io(msg) => write!(f, "IO error: {}", msg),
            QLearnerError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for QLearnerError {}

impl From<std::io::Error> for QLearnerError {
    fn from(err: std::io::Error) -> Self {
        QLearnerError::Io(err.to_string())
    }
}

impl From<bincode::Error> for QLearnerError {
    fn from(err: bincode::Error) -> Self {
        QLearnerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for QLearnerError {
    fn from(err: serde_json::Error) -> Self {
        QLearnerError::Serialization(err.to_string())
    }
}

impl QLearnerError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        QLearnerError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        QLearnerError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an observation whose length differs from the network input.
    pub(crate) fn observation_length(expected: usize, actual: usize) -> Self {
        QLearnerError::DimensionMismatch {
            expected: format!("observation of length {}", expected),
            actual: format!("length {}", actual),
        }
    }
}
