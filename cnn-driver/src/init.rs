//! Parameter initialization policy.
//!
//! Every parameterized stage of the network is tagged with a [`StageKind`].
//! The kind decides the initializer of its parameters, so the policy is applied
//! while the stages are built, without inspecting modules afterwards.
use candle_nn::{
    init::{FanInOut, NonLinearity, NormalOrUniform},
    Init,
};
use serde::{Deserialize, Serialize};

/// Mean of the initial scale of batch normalization.
pub const NORM_SCALE_MEAN: f64 = 1.0;

/// Standard deviation of the initial scale of batch normalization.
pub const NORM_SCALE_STD: f64 = 0.02;

/// Kind of a parameterized stage.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum StageKind {
    /// 2D convolution.
    Convolution,

    /// Per-channel batch normalization.
    Normalization,

    /// Fully-connected layer.
    Linear,
}

impl StageKind {
    /// Initializer of the weight (the scale for [`StageKind::Normalization`]).
    ///
    /// * Convolution: Kaiming normal with the fan-out convention and ReLU gain,
    ///   i.e. `N(0, 2 / (out_channels * k * k))`.
    /// * Normalization: `N(1.0, 0.02)`.
    /// * Linear: candle's default for [`candle_nn::linear`], Kaiming normal with fan-in.
    pub fn weight_init(&self) -> Init {
        match self {
            Self::Convolution => Init::Kaiming {
                dist: NormalOrUniform::Normal,
                fan: FanInOut::FanOut,
                non_linearity: NonLinearity::ReLU,
            },
            Self::Normalization => Init::Randn {
                mean: NORM_SCALE_MEAN,
                stdev: NORM_SCALE_STD,
            },
            Self::Linear => candle_nn::init::DEFAULT_KAIMING_NORMAL,
        }
    }

    /// Initializer of the bias (the shift for [`StageKind::Normalization`]).
    ///
    /// `fan_in` is the number of inputs of a unit, ignored for normalization.
    pub fn bias_init(&self, fan_in: usize) -> Init {
        match self {
            Self::Normalization => Init::Const(0.),
            Self::Convolution | Self::Linear => {
                let bound = 1. / (fan_in as f64).sqrt();
                Init::Uniform {
                    lo: -bound,
                    up: bound,
                }
            }
        }
    }
}

/// Description of a parameterized stage of the network.
#[derive(Clone, Debug, PartialEq)]
pub struct StageInfo {
    /// Prefix of the parameters in the [`VarMap`](candle_nn::VarMap), e.g. `layer1.0`.
    pub name: String,

    /// Kind of the stage.
    pub kind: StageKind,

    /// Names of the parameters owned by the stage, without the prefix.
    pub params: Vec<&'static str>,
}

impl StageInfo {
    pub(crate) fn new(name: impl Into<String>, kind: StageKind) -> Self {
        let params = match kind {
            StageKind::Normalization => vec!["weight", "bias", "running_mean", "running_var"],
            StageKind::Convolution | StageKind::Linear => vec!["weight", "bias"],
        };
        Self {
            name: name.into(),
            kind,
            params,
        }
    }

    /// Full names of the parameters, e.g. `layer1.1.running_mean`.
    pub fn param_names(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|p| format!("{}.{}", self.name, p))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util;
    use anyhow::Result;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_conv_weight_uses_fan_out() -> Result<()> {
        let varmap = VarMap::new();
        let init = StageKind::Convolution.weight_init();
        let w = varmap.get((64, 48, 3, 3), "w", init, DType::F32, &Device::Cpu)?;

        // fan-out = 64 * 3 * 3, fan-in would give sqrt(2 / 432) ~ 0.068
        let expected = (2f32 / 576.).sqrt();
        let actual = util::std(&w)?;
        assert!(
            (actual - expected).abs() / expected < 0.05,
            "std {} expected {}",
            actual,
            expected
        );

        Ok(())
    }

    #[test]
    fn test_norm_shift_is_zero() -> Result<()> {
        let varmap = VarMap::new();
        let init = StageKind::Normalization.bias_init(0);
        let b = varmap.get(64, "b", init, DType::F32, &Device::Cpu)?;
        assert!(b.to_vec1::<f32>()?.iter().all(|v| *v == 0.));

        Ok(())
    }

    #[test]
    fn test_stage_info_param_names() {
        let info = StageInfo::new("layer2.1", StageKind::Normalization);
        assert_eq!(
            info.param_names(),
            vec![
                "layer2.1.weight",
                "layer2.1.bias",
                "layer2.1.running_mean",
                "layer2.1.running_var"
            ]
        );
    }
}
