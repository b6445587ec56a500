use super::{DecisionHeadConfig, FcStageConfig};
use crate::{model::SubModel, Activation, DriverError, Mode, StageKind};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{Dropout, Linear, Module, ModuleT, VarBuilder};
use log::trace;

/// Linear layer with weights initialized following [`StageKind::Linear`].
fn create_linear(vb: &VarBuilder, in_dim: usize, out_dim: usize) -> Result<Linear> {
    let kind = StageKind::Linear;
    let vb = vb.pp("0");
    let ws = vb.get_with_hints((out_dim, in_dim), "weight", kind.weight_init())?;
    let bs = vb.get_with_hints(out_dim, "bias", kind.bias_init(in_dim))?;
    Ok(Linear::new(ws, Some(bs)))
}

/// Linear layer, ReLU and dropout.
pub struct FcStage {
    linear: Linear,
    dropout: Dropout,
}

impl SubModel for FcStage {
    type Config = FcStageConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: &Self::Config) -> Result<Self> {
        let linear = create_linear(&vb, config.in_dim, config.out_dim)?;
        let dropout = Dropout::new(config.drop_p);
        Ok(Self { linear, dropout })
    }

    fn forward(&self, xs: &Self::Input, mode: Mode) -> Result<Tensor> {
        let xs = self.linear.forward(xs)?.relu()?;
        Ok(self.dropout.forward_t(&xs, mode.is_train())?)
    }
}

/// Hidden [`FcStage`]s followed by a linear projection.
pub struct DecisionHead {
    in_dim: usize,
    stages: Vec<FcStage>,
    out: Linear,
    activation_out: Activation,
}

impl DecisionHead {
    /// Length of the feature vector accepted by the head.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }
}

impl SubModel for DecisionHead {
    type Config = DecisionHeadConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: &Self::Config) -> Result<Self> {
        config.check()?;

        let stages = config
            .fc_stages()
            .iter()
            .enumerate()
            .map(|(i, c)| FcStage::build(vb.pp(DecisionHeadConfig::stage_name(i)), c))
            .collect::<Result<Vec<_>>>()?;
        let out = {
            // `check()` rejects an empty `units`
            let in_dim = config.units[config.units.len() - 1];
            let vb = vb.pp(DecisionHeadConfig::out_stage_name());
            create_linear(&vb, in_dim, config.out_dim)?
        };

        Ok(Self {
            in_dim: config.in_dim,
            stages,
            out,
            activation_out: config.activation_out,
        })
    }

    fn forward(&self, xs: &Self::Input, mode: Mode) -> Result<Tensor> {
        let dims = xs.dims();
        if dims.len() != 2 || dims[1] != self.in_dim {
            return Err(DriverError::FlattenMismatch {
                expected: self.in_dim,
                actual: dims.iter().skip(1).product(),
            }
            .into());
        }

        let mut xs = xs.clone();
        for (i, stage) in self.stages.iter().enumerate() {
            xs = stage.forward(&xs, mode)?;
            trace!("fc{}: {:?}", i + 1, xs.dims());
        }

        let xs = self.out.forward(&xs)?;
        Ok(self.activation_out.forward(&xs)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn build(config: &DecisionHeadConfig) -> Result<DecisionHead> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        DecisionHead::build(vb, config)
    }

    #[test]
    fn test_output_shape() -> Result<()> {
        let head = build(&DecisionHeadConfig::default())?;
        let xs = Tensor::randn(0f32, 1f32, (3, 1152), &Device::Cpu)?;
        assert_eq!(head.forward(&xs, Mode::Eval)?.dims(), &[3, 1]);
        assert_eq!(head.forward(&xs, Mode::Train)?.dims(), &[3, 1]);
        Ok(())
    }

    #[test]
    fn test_rejects_wrong_feature_length() -> Result<()> {
        let head = build(&DecisionHeadConfig::default())?;
        let xs = Tensor::zeros((1, 1100), DType::F32, &Device::Cpu)?;
        let err = head.forward(&xs, Mode::Eval).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DriverError>(),
            Some(&DriverError::FlattenMismatch {
                expected: 1152,
                actual: 1100
            })
        );
        Ok(())
    }

    #[test]
    fn test_tanh_bounds_output() -> Result<()> {
        let config = DecisionHeadConfig::new(8, vec![16], 1).activation_out(Activation::Tanh);
        let head = build(&config)?;
        let xs = Tensor::randn(0f32, 100f32, (64, 8), &Device::Cpu)?;
        let ys = head.forward(&xs, Mode::Eval)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(ys.iter().all(|y| y.abs() <= 1.0));
        Ok(())
    }

    #[test]
    fn test_dropout_is_identity_in_eval_mode() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = FcStageConfig {
            in_dim: 4,
            out_dim: 32,
            drop_p: 0.8,
        };
        let stage = FcStage::build(vb.pp("fc1"), &config)?;
        let xs = Tensor::randn(0f32, 1f32, (2, 4), &Device::Cpu)?;

        let ys1 = stage.forward(&xs, Mode::Eval)?.to_vec2::<f32>()?;
        let ys2 = stage.forward(&xs, Mode::Eval)?.to_vec2::<f32>()?;
        assert_eq!(ys1, ys2);

        // Surviving units are scaled by 1 / (1 - 0.8)
        let ys = stage.forward(&xs, Mode::Train)?.to_vec2::<f32>()?;
        for (y, y_eval) in ys.iter().flatten().zip(ys1.iter().flatten()) {
            assert!(*y == 0. || (y - 5. * y_eval).abs() < 1e-4 * y_eval.abs().max(1.));
        }
        Ok(())
    }
}
