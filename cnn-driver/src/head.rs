//! Fully-connected decision head.
//!
//! Hidden stages apply a linear layer, ReLU and dropout; a final linear
//! projection produces the steering command.
mod base;
mod config;
pub use base::{DecisionHead, FcStage};
pub use config::{DecisionHeadConfig, FcStageConfig};

/// Drop probability of the hidden stages.
///
/// This is far above the usual 0.2-0.5 and likely a tuning leftover. It is kept
/// as is since trained checkpoints were produced with it; revisit when retraining.
pub const DEFAULT_DROP_P: f32 = 0.8;
