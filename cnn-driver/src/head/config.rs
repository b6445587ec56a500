use super::DEFAULT_DROP_P;
use crate::{init::StageInfo, Activation, DriverError, StageKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of a hidden [`FcStage`](super::FcStage).
pub struct FcStageConfig {
    pub in_dim: usize,
    pub out_dim: usize,
    pub drop_p: f32,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DecisionHead`](super::DecisionHead).
pub struct DecisionHeadConfig {
    /// Length of the flattened feature vector.
    pub in_dim: usize,

    /// Output dimensions of the hidden stages.
    pub units: Vec<usize>,

    /// Output dimension of the final projection.
    pub out_dim: usize,

    /// Drop probability of every hidden stage.
    #[serde(default = "default_drop_p")]
    pub drop_p: f32,

    /// Activation applied to the final projection.
    #[serde(default)]
    pub activation_out: Activation,
}

fn default_drop_p() -> f32 {
    DEFAULT_DROP_P
}

impl Default for DecisionHeadConfig {
    fn default() -> Self {
        Self {
            in_dim: 1152,
            units: vec![1164, 100, 50, 10],
            out_dim: 1,
            drop_p: DEFAULT_DROP_P,
            activation_out: Activation::None,
        }
    }
}

impl DecisionHeadConfig {
    /// Creates configuration of the head.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            ..Default::default()
        }
    }

    /// Sets the length of the flattened feature vector.
    pub fn in_dim(mut self, v: usize) -> Self {
        self.in_dim = v;
        self
    }

    /// Sets the output dimension.
    pub fn out_dim(mut self, v: usize) -> Self {
        self.out_dim = v;
        self
    }

    /// Sets the drop probability of the hidden stages.
    pub fn drop_p(mut self, v: f32) -> Self {
        self.drop_p = v;
        self
    }

    /// Sets the activation of the final projection.
    pub fn activation_out(mut self, v: Activation) -> Self {
        self.activation_out = v;
        self
    }

    /// Name of the `i`-th hidden stage (zero-based), e.g. `fc1`.
    pub fn stage_name(i: usize) -> String {
        format!("fc{}", i + 1)
    }

    /// Name of the final projection.
    pub fn out_stage_name() -> &'static str {
        "fc_out"
    }

    /// Checks the drop probability and the number of hidden stages.
    pub fn check(&self) -> Result<(), DriverError> {
        if self.units.is_empty() {
            return Err(DriverError::EmptyHead);
        }
        if !(0.0..1.0).contains(&self.drop_p) {
            return Err(DriverError::InvalidDropout(self.drop_p));
        }
        Ok(())
    }

    /// Configurations of the hidden stages.
    pub fn fc_stages(&self) -> Vec<FcStageConfig> {
        let mut in_dim = self.in_dim;
        self.units
            .iter()
            .map(|&out_dim| {
                let stage = FcStageConfig {
                    in_dim,
                    out_dim,
                    drop_p: self.drop_p,
                };
                in_dim = out_dim;
                stage
            })
            .collect()
    }

    /// Parameterized stages in forward order.
    pub fn stage_infos(&self) -> Vec<StageInfo> {
        (0..self.units.len())
            .map(|i| StageInfo::new(format!("{}.0", Self::stage_name(i)), StageKind::Linear))
            .chain(std::iter::once(StageInfo::new(
                format!("{}.0", Self::out_stage_name()),
                StageKind::Linear,
            )))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fc_stages() {
        let stages = DecisionHeadConfig::default().fc_stages();
        let dims = stages
            .iter()
            .map(|s| (s.in_dim, s.out_dim))
            .collect::<Vec<_>>();

        assert_eq!(dims, vec![(1152, 1164), (1164, 100), (100, 50), (50, 10)]);
        assert!(stages.iter().all(|s| s.drop_p == 0.8));
    }

    #[test]
    fn test_check() {
        assert_eq!(DecisionHeadConfig::default().check(), Ok(()));
        assert_eq!(
            DecisionHeadConfig::default().drop_p(1.0).check(),
            Err(DriverError::InvalidDropout(1.0))
        );
        assert_eq!(
            DecisionHeadConfig::new(1152, vec![], 1).check(),
            Err(DriverError::EmptyHead)
        );
    }

    #[test]
    fn test_stage_infos() {
        let names = DecisionHeadConfig::default()
            .stage_infos()
            .into_iter()
            .map(|s| s.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["fc1.0", "fc2.0", "fc3.0", "fc4.0", "fc_out.0"]);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let yaml = "in_dim: 1152\nunits: [1164, 100, 50, 10]\nout_dim: 1\n";
        let config: DecisionHeadConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config, DecisionHeadConfig::default());
    }
}
