use crate::{init::StageInfo, DriverError, StageKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of a [`ConvStage`](super::ConvStage).
///
/// Kernels are square.
pub struct ConvStageConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub stride: usize,
    #[serde(default)]
    pub padding: usize,
}

impl ConvStageConfig {
    /// Creates an unpadded convolution stage.
    pub fn new(in_channels: usize, out_channels: usize, kernel: usize, stride: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            kernel,
            stride,
            padding: 0,
        }
    }

    /// Sets padding.
    pub fn padding(mut self, v: usize) -> Self {
        self.padding = v;
        self
    }

    /// Returns the spatial size of the output given the input size along one axis.
    ///
    /// `stage` is only used in error messages.
    pub fn out_size(&self, size: usize, stage: &str) -> Result<usize, DriverError> {
        if self.stride == 0 {
            return Err(DriverError::InvalidStride(stage.to_string()));
        }
        let padded = size + 2 * self.padding;
        if padded < self.kernel {
            return Err(DriverError::SpatialUnderflow {
                stage: stage.to_string(),
                size: padded,
                kernel: self.kernel,
            });
        }
        Ok((padded - self.kernel) / self.stride + 1)
    }

    /// Number of inputs of a single output unit.
    pub fn fan_in(&self) -> usize {
        self.in_channels * self.kernel * self.kernel
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`FeatureExtractor`](super::FeatureExtractor).
pub struct FeatureExtractorConfig {
    /// Shape of an input frame, `[channels, height, width]`.
    pub in_shape: [usize; 3],

    /// Convolution stages in forward order.
    pub stages: Vec<ConvStageConfig>,
}

impl Default for FeatureExtractorConfig {
    /// Five stages for 66x200 RGB frames.
    fn default() -> Self {
        Self {
            in_shape: [3, 66, 200],
            stages: vec![
                ConvStageConfig::new(3, 24, 5, 2),
                ConvStageConfig::new(24, 36, 5, 2),
                ConvStageConfig::new(36, 48, 5, 2),
                ConvStageConfig::new(48, 64, 3, 1),
                ConvStageConfig::new(64, 64, 3, 1),
            ],
        }
    }
}

impl FeatureExtractorConfig {
    /// Sets the shape of an input frame.
    pub fn in_shape(mut self, v: [usize; 3]) -> Self {
        self.in_shape = v;
        self
    }

    /// Sets the convolution stages.
    pub fn stages(mut self, v: Vec<ConvStageConfig>) -> Self {
        self.stages = v;
        self
    }

    /// Name of the `i`-th stage (zero-based), e.g. `layer1`.
    pub fn stage_name(i: usize) -> String {
        format!("layer{}", i + 1)
    }

    /// Output shapes `[channels, height, width]` of every stage.
    pub fn stage_shapes(&self) -> Result<Vec<[usize; 3]>, DriverError> {
        let [mut c, mut h, mut w] = self.in_shape;
        let mut shapes = Vec::with_capacity(self.stages.len());

        for (i, stage) in self.stages.iter().enumerate() {
            let name = Self::stage_name(i);
            if stage.in_channels != c {
                return Err(DriverError::ChannelMismatch {
                    stage: name,
                    expected: c,
                    actual: stage.in_channels,
                });
            }
            h = stage.out_size(h, &name)?;
            w = stage.out_size(w, &name)?;
            c = stage.out_channels;
            shapes.push([c, h, w]);
        }

        Ok(shapes)
    }

    /// Output shape `[channels, height, width]` of the last stage.
    pub fn out_shape(&self) -> Result<[usize; 3], DriverError> {
        Ok(self
            .stage_shapes()?
            .last()
            .cloned()
            .unwrap_or(self.in_shape))
    }

    /// Length of the flattened output of the last stage.
    pub fn flatten_dim(&self) -> Result<usize, DriverError> {
        Ok(self.out_shape()?.iter().product())
    }

    /// Parameterized stages in forward order.
    ///
    /// Within `layer{i}`, index 0 is the convolution and index 1 the normalization.
    pub fn stage_infos(&self) -> Vec<StageInfo> {
        (0..self.stages.len())
            .flat_map(|i| {
                let name = Self::stage_name(i);
                vec![
                    StageInfo::new(format!("{}.0", name), StageKind::Convolution),
                    StageInfo::new(format!("{}.1", name), StageKind::Normalization),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_flattens_to_1152() {
        let config = FeatureExtractorConfig::default();
        assert_eq!(
            config.stage_shapes().unwrap(),
            vec![
                [24, 31, 98],
                [36, 14, 47],
                [48, 5, 22],
                [64, 3, 20],
                [64, 1, 18]
            ]
        );
        assert_eq!(config.flatten_dim(), Ok(1152));
    }

    #[test]
    fn test_kernel_larger_than_input() {
        let mut config = FeatureExtractorConfig::default();
        config.stages[4].kernel = 5;

        assert_eq!(
            config.out_shape(),
            Err(DriverError::SpatialUnderflow {
                stage: "layer5".to_string(),
                size: 3,
                kernel: 5
            })
        );
    }

    #[test]
    fn test_padding_enlarges_output() {
        let stage = ConvStageConfig::new(3, 8, 3, 1).padding(1);
        assert_eq!(stage.out_size(10, "layer1"), Ok(10));
        assert_eq!(stage.fan_in(), 27);
    }

    #[test]
    fn test_zero_stride() {
        let stage = ConvStageConfig::new(3, 8, 3, 0);
        assert_eq!(
            stage.out_size(10, "layer1"),
            Err(DriverError::InvalidStride("layer1".to_string()))
        );
    }

    #[test]
    fn test_channel_mismatch() {
        let mut config = FeatureExtractorConfig::default();
        config.stages[2].in_channels = 24;

        assert_eq!(
            config.flatten_dim(),
            Err(DriverError::ChannelMismatch {
                stage: "layer3".to_string(),
                expected: 36,
                actual: 24
            })
        );
    }

    #[test]
    fn test_stage_infos() {
        let infos = FeatureExtractorConfig::default().stage_infos();
        assert_eq!(infos.len(), 10);
        assert_eq!(infos[0].name, "layer1.0");
        assert_eq!(infos[0].kind, StageKind::Convolution);
        assert_eq!(infos[9].name, "layer5.1");
        assert_eq!(infos[9].kind, StageKind::Normalization);
    }
}
