use ndarray::{Array1, ArrayView1};
use serde::{Serialize, Deserialize};

/// Trait defining the interface for loss functions
pub trait Loss {
    /// Mean loss over a batch of predictions and targets
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32;

    /// Gradient of the mean loss with respect to each prediction
    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32>;
}

/// Mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct MseLoss;

impl Loss for MseLoss {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| x * x).mean().unwrap_or(0.0)
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predictions.len().max(1) as f32;
        (&predictions - &targets) * (2.0 / n)
    }
}

/// Huber loss (smooth L1)
#[derive(Debug, Clone, Copy)]
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Loss for HuberLoss {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            let abs_x = x.abs();
            if abs_x <= self.delta {
                0.5 * x * x
            } else {
                self.delta * abs_x - 0.5 * self.delta * self.delta
            }
        }).mean().unwrap_or(0.0)
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        let n = predictions.len().max(1) as f32;
        let delta = self.delta;
        (&predictions - &targets).mapv(|x| x.clamp(-delta, delta) / n)
    }
}

/// Serializable loss selector used by the agent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LossKind {
    #[default]
    Mse,
    Huber { delta: f32 },
}

impl Loss for LossKind {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f32 {
        match self {
            LossKind::Mse => MseLoss.compute(predictions, targets),
            LossKind::Huber { delta } => HuberLoss::new(*delta).compute(predictions, targets),
        }
    }

    fn gradient(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> Array1<f32> {
        match self {
            LossKind::Mse => MseLoss.gradient(predictions, targets),
            LossKind::Huber { delta } => HuberLoss::new(*delta).gradient(predictions, targets),
        }
    }
}
