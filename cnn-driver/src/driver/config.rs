//! Configuration of the driver network.
use crate::{
    conv::FeatureExtractorConfig, head::DecisionHeadConfig, init::StageInfo, DriverError,
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CnnDriver`](super::CnnDriver).
///
/// The default is the fixed architecture for 66x200 RGB frames. Other shapes can be
/// declared, but the flattened length of the feature extractor must equal
/// `head.in_dim`; it is recomputed and checked when the network is built.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct CnnDriverConfig {
    pub features: FeatureExtractorConfig,
    pub head: DecisionHeadConfig,
}

impl CnnDriverConfig {
    /// Sets the configuration of the feature extractor.
    pub fn features(mut self, v: FeatureExtractorConfig) -> Self {
        self.features = v;
        self
    }

    /// Sets the configuration of the decision head.
    pub fn head(mut self, v: DecisionHeadConfig) -> Self {
        self.head = v;
        self
    }

    /// Shape `[channels, height, width]` of an input frame.
    pub fn in_shape(&self) -> [usize; 3] {
        self.features.in_shape
    }

    /// Checks the consistency of the configuration.
    ///
    /// Returns the length of the flattened feature vector.
    pub fn check(&self) -> Result<usize, DriverError> {
        self.head.check()?;
        let flatten_dim = self.features.flatten_dim()?;
        if flatten_dim != self.head.in_dim {
            return Err(DriverError::FlattenMismatch {
                expected: self.head.in_dim,
                actual: flatten_dim,
            });
        }
        Ok(flatten_dim)
    }

    /// Parameterized stages of the network in forward order.
    pub fn stage_infos(&self) -> Vec<StageInfo> {
        let mut infos = self.features.stage_infos();
        infos.extend(self.head.stage_infos());
        infos
    }

    /// Loads [`CnnDriverConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of CnnDriver from {:?}", path_);
        Ok(b)
    }

    /// Saves [`CnnDriverConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of CnnDriver into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{conv::ConvStageConfig, Activation};
    use tempdir::TempDir;

    #[test]
    fn test_serde_cnn_driver_config() -> Result<()> {
        let config = CnnDriverConfig::default().head(
            DecisionHeadConfig::default()
                .drop_p(0.5)
                .activation_out(Activation::Tanh),
        );

        let dir = TempDir::new("cnn_driver_config")?;
        let path = dir.path().join("cnn_driver.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = CnnDriverConfig::load(&path)?;
        assert_eq!(config, config_);

        let yaml = serde_yaml::to_string(&config)?;
        println!("{}", yaml);

        Ok(())
    }

    #[test]
    fn test_default_is_consistent() {
        assert_eq!(CnnDriverConfig::default().check(), Ok(1152));
        assert_eq!(CnnDriverConfig::default().stage_infos().len(), 15);
    }

    #[test]
    fn test_changed_kernel_without_head_update() {
        let mut config = CnnDriverConfig::default();
        config.features.stages[4] = ConvStageConfig::new(64, 64, 1, 1);

        // 64 x 3 x 20
        assert_eq!(
            config.check(),
            Err(DriverError::FlattenMismatch {
                expected: 1152,
                actual: 3840
            })
        );

        let config = config.head(DecisionHeadConfig::default().in_dim(3840));
        assert_eq!(config.check(), Ok(3840));
    }

    #[test]
    fn test_other_input_size_needs_new_in_dim() {
        let mut config = CnnDriverConfig::default();
        config.features = config.features.in_shape([3, 66, 220]);

        // width: 220 -> 108 -> 52 -> 24 -> 22 -> 20
        assert_eq!(
            config.check(),
            Err(DriverError::FlattenMismatch {
                expected: 1152,
                actual: 1280
            })
        );
    }
}
