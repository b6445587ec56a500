//! Convolutional steering model implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The network follows the end-to-end driving architecture that maps a single
//! forward-facing camera frame of 66x200 pixels to a scalar steering command.
//! Data loading, the training loop and serving are left to the caller; this crate
//! only defines the layers, their initialization and the forward pass.
//!
//! ```no_run
//! # use anyhow::Result;
//! use candle_core::{DType, Device, Tensor};
//! use cnn_driver::{CnnDriver, CnnDriverConfig};
//!
//! # fn main() -> Result<()> {
//! let mut driver = CnnDriver::build(CnnDriverConfig::default(), Device::Cpu)?;
//! driver.eval();
//! let frames = Tensor::zeros((4, 3, 66, 200), DType::F32, &Device::Cpu)?;
//! let steering = driver.forward(&frames)?;
//! assert_eq!(steering.dims(), &[4, 1]);
//! # Ok(())
//! # }
//! ```
pub mod conv;
pub mod driver;
mod error;
pub mod head;
pub mod init;
pub mod model;
pub mod record;
pub mod util;
use candle_core::Tensor;
pub use driver::{CnnDriver, CnnDriverConfig};
pub use error::DriverError;
pub use init::{StageInfo, StageKind};
use serde::{Deserialize, Serialize};

/// Mode of the network.
///
/// The mode decides whether batch normalization uses batch statistics and
/// whether dropout is active. It is passed explicitly to every stage.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Mode {
    /// Batch statistics, running statistics updated, dropout active.
    Train,

    /// Running statistics, dropout disabled.
    Eval,
}

impl Mode {
    /// Returns `true` in [`Mode::Train`].
    pub fn is_train(&self) -> bool {
        matches!(self, Self::Train)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::Train
    }
}

/// Activation function applied to the output of the final layer.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Activation {
    /// Identity.
    None,

    /// Rectified linear unit.
    ReLU,

    /// Hyperbolic tangent, bounds the output to `(-1, 1)`.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::None => Ok(xs.clone()),
            Self::ReLU => xs.relu(),
            Self::Tanh => xs.tanh(),
        }
    }
}

impl Default for Activation {
    fn default() -> Self {
        Self::None
    }
}
