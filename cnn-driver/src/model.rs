//! Interface of the sub-networks composing the driver.
use crate::Mode;
use anyhow::Result;
use candle_nn::VarBuilder;

/// Neural network model not owing its [`VarMap`] internally.
///
/// Parameters are created through the given [`VarBuilder`], so that several
/// sub-models can share the [`VarMap`] of the network owning them.
///
/// [`VarMap`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_map/struct.VarMap.html
/// [`VarBuilder`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_builder/type.VarBuilder.html
pub trait SubModel: Sized {
    /// Configuration from which [`SubModel`] is constructed.
    type Config;

    /// Input of the [`SubModel`].
    type Input;

    /// Output of the [`SubModel`].
    type Output;

    /// Builds [`SubModel`] with [`VarBuilder`] and [`SubModel::Config`].
    fn build(vb: VarBuilder, config: &Self::Config) -> Result<Self>;

    /// Forward computation in the given [`Mode`].
    fn forward(&self, input: &Self::Input, mode: Mode) -> Result<Self::Output>;
}
