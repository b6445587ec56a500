use super::{ConvStageConfig, FeatureExtractorConfig, BN_EPS};
use crate::{model::SubModel, DriverError, Mode, StageKind};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{
    conv::Conv2dConfig, BatchNorm, Conv2d, Init, Module, ModuleT, VarBuilder,
};
use log::trace;

/// Convolution, batch normalization and ReLU.
///
/// Parameters are named after their position in the stage, `0` for the
/// convolution and `1` for the normalization, e.g. `layer1.0.weight` or
/// `layer1.1.running_var`.
pub struct ConvStage {
    conv: Conv2d,
    norm: BatchNorm,
}

impl ConvStage {
    fn create_conv(vb: &VarBuilder, config: &ConvStageConfig) -> Result<Conv2d> {
        let kind = StageKind::Convolution;
        let vb = vb.pp("0");
        let ws = vb.get_with_hints(
            (
                config.out_channels,
                config.in_channels,
                config.kernel,
                config.kernel,
            ),
            "weight",
            kind.weight_init(),
        )?;
        let bs = vb.get_with_hints(
            config.out_channels,
            "bias",
            kind.bias_init(config.fan_in()),
        )?;
        let conv_config = Conv2dConfig {
            stride: config.stride,
            padding: config.padding,
            ..Default::default()
        };

        Ok(Conv2d::new(ws, Some(bs), conv_config))
    }

    fn create_norm(vb: &VarBuilder, num_features: usize) -> Result<BatchNorm> {
        let kind = StageKind::Normalization;
        let vb = vb.pp("1");
        let running_mean = vb.get_with_hints(num_features, "running_mean", Init::Const(0.))?;
        let running_var = vb.get_with_hints(num_features, "running_var", Init::Const(1.))?;
        let weight = vb.get_with_hints(num_features, "weight", kind.weight_init())?;
        let bias = vb.get_with_hints(num_features, "bias", kind.bias_init(0))?;

        Ok(BatchNorm::new(
            num_features,
            running_mean,
            running_var,
            weight,
            bias,
            BN_EPS,
        )?)
    }
}

impl SubModel for ConvStage {
    type Config = ConvStageConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: &Self::Config) -> Result<Self> {
        let conv = Self::create_conv(&vb, config)?;
        let norm = Self::create_norm(&vb, config.out_channels)?;
        Ok(Self { conv, norm })
    }

    fn forward(&self, xs: &Self::Input, mode: Mode) -> Result<Tensor> {
        let xs = self.conv.forward(xs)?;
        let xs = self.norm.forward_t(&xs, mode.is_train())?;
        Ok(xs.relu()?)
    }
}

/// Stack of [`ConvStage`]s.
///
/// The output is not flattened, see [`CnnDriver::features`](crate::CnnDriver::features).
pub struct FeatureExtractor {
    in_shape: [usize; 3],
    stages: Vec<ConvStage>,
}

impl FeatureExtractor {
    /// Shape `[channels, height, width]` of a frame accepted by the extractor.
    pub fn in_shape(&self) -> [usize; 3] {
        self.in_shape
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if there is no stage.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Checks that `xs` is a non-empty batch of frames of the expected shape.
    pub fn check_input(&self, xs: &Tensor) -> Result<(), DriverError> {
        let dims = xs.dims();
        if dims.len() != 4 || dims[1..] != self.in_shape[..] {
            return Err(DriverError::InputShape {
                expected: self.in_shape,
                actual: dims.to_vec(),
            });
        }
        if dims[0] == 0 {
            return Err(DriverError::EmptyBatch);
        }
        Ok(())
    }
}

impl SubModel for FeatureExtractor {
    type Config = FeatureExtractorConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: &Self::Config) -> Result<Self> {
        // Fails on kernels not fitting their input before any parameter is created
        config.out_shape()?;

        let stages = config
            .stages
            .iter()
            .enumerate()
            .map(|(i, c)| {
                ConvStage::build(vb.pp(FeatureExtractorConfig::stage_name(i)), c)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            in_shape: config.in_shape,
            stages,
        })
    }

    fn forward(&self, xs: &Self::Input, mode: Mode) -> Result<Tensor> {
        self.check_input(xs)?;
        let mut xs = xs.clone();

        for (i, stage) in self.stages.iter().enumerate() {
            xs = stage.forward(&xs, mode)?;
            trace!("layer{}: {:?}", i + 1, xs.dims());
        }

        Ok(xs)
    }
}
