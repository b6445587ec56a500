use super::CnnDriverConfig;
use crate::{
    conv::FeatureExtractor, head::DecisionHead, init::StageInfo, model::SubModel,
    record::Record, util, DriverError, Mode,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::{info, trace};
use std::path::Path;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Convolutional network mapping a camera frame to a steering command.
///
/// ```mermaid
/// graph LR
///     Frame["frame (N, 3, 66, 200)"] --> F[FeatureExtractor]
///     F --> Flatten["flatten (N, 1152)"]
///     Flatten --> H[DecisionHead]
///     H --> Steering["steering (N, 1)"]
/// ```
///
/// The network owns its parameters in a [`VarMap`]. A training harness builds its
/// optimizer from [`CnnDriver::varmap`] and switches the [`Mode`] before each phase;
/// the mode is held here and passed to every stage on [`CnnDriver::forward`].
///
/// Parameter names follow the layout `layer{i}.0.*` (convolution), `layer{i}.1.*`
/// (normalization), `fc{i}.0.*` and `fc_out.0.*`.
pub struct CnnDriver {
    device: Device,
    varmap: VarMap,
    mode: Mode,
    features: FeatureExtractor,
    head: DecisionHead,
    stages: Vec<StageInfo>,
    config: CnnDriverConfig,
}

impl CnnDriver {
    /// Constructs [`CnnDriver`] with freshly initialized parameters.
    ///
    /// The network starts in [`Mode::Train`].
    pub fn build(config: CnnDriverConfig, device: Device) -> Result<Self> {
        let flatten_dim = config.check()?;
        let varmap = VarMap::new();
        let (features, head) = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            let features = FeatureExtractor::build(vb.clone(), &config.features)?;
            let head = DecisionHead::build(vb, &config.head)?;
            (features, head)
        };
        let stages = config.stage_infos();
        info!(
            "Build CnnDriver: {} stages, {} features, {} parameters",
            stages.len(),
            flatten_dim,
            util::n_params(&varmap)
        );

        Ok(Self {
            device,
            varmap,
            mode: Mode::default(),
            features,
            head,
            stages,
            config,
        })
    }

    /// Returns the steering command, `(N, out_dim)`, for a batch of frames.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = self.features(xs)?;
        self.head.forward(&xs, self.mode)
    }

    /// Returns the flattened output of the feature extractor, `(N, 1152)` with the
    /// default configuration.
    pub fn features(&self, xs: &Tensor) -> Result<Tensor> {
        self.features.check_input(xs)?;
        let xs = xs.to_device(&self.device)?.to_dtype(DType::F32)?;
        let xs = self.features.forward(&xs, self.mode)?.flatten_from(1)?;
        trace!("flatten: {:?}", xs.dims());

        let dim = xs.dims()[1];
        if dim != self.head.in_dim() {
            return Err(DriverError::FlattenMismatch {
                expected: self.head.in_dim(),
                actual: dim,
            }
            .into());
        }

        Ok(xs)
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Switches to [`Mode::Train`].
    pub fn train(&mut self) {
        self.set_mode(Mode::Train);
    }

    /// Switches to [`Mode::Eval`].
    pub fn eval(&mut self) {
        self.set_mode(Mode::Eval);
    }

    /// Returns `true` in [`Mode::Train`].
    pub fn is_train(&self) -> bool {
        self.mode.is_train()
    }

    /// Parameterized stages in forward order.
    pub fn stages(&self) -> &[StageInfo] {
        &self.stages
    }

    pub fn config(&self) -> &CnnDriverConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn varmap_mut(&mut self) -> &mut VarMap {
        &mut self.varmap
    }

    /// Returns the parameters sorted by name.
    pub fn named_parameters(&self) -> Result<Vec<(String, Tensor)>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow::anyhow!("VarMap lock is poisoned"))?;
        let mut params = data
            .iter()
            .map(|(k, v)| (k.clone(), v.as_tensor().clone()))
            .collect::<Vec<_>>();
        params.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(params)
    }

    /// Returns the parameter of the given name.
    pub fn parameter(&self, name: &str) -> Result<Tensor> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| anyhow::anyhow!("VarMap lock is poisoned"))?;
        data.get(name)
            .map(|v| v.as_tensor().clone())
            .ok_or_else(|| anyhow::anyhow!("No parameter named {}", name))
    }

    /// Number of scalar parameters, running statistics included.
    pub fn n_params(&self) -> usize {
        util::n_params(&self.varmap)
    }

    /// Mean and standard deviation of every parameter.
    pub fn param_stats(&self) -> Result<Record> {
        util::param_stats(&self.varmap)
    }

    /// Saves parameters in safetensors format.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save CnnDriver to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads parameters in safetensors format.
    ///
    /// Every parameter of the network must be present in the file with the same shape.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load CnnDriver from {:?}", path.as_ref());
        Ok(())
    }
}
