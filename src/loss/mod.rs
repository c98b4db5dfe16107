//! Regression losses between current action-value estimates and TD targets.
//!
//! Both losses act on the column of estimates for the actions actually taken,
//! one entry per sampled transition, and are averaged over the batch.

pub mod functions;

pub use functions::{HuberLoss, Loss, LossKind, MseLoss};
