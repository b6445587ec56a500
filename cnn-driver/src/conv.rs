//! Convolutional feature extractor.
//!
//! Each stage applies a 2D convolution, batch normalization and ReLU.
//! With the default configuration a `(N, 3, 66, 200)` frame is reduced to a
//! `(N, 64, 1, 18)` volume, i.e. 1152 features per frame.
mod base;
mod config;
pub use base::{ConvStage, FeatureExtractor};
pub use config::{ConvStageConfig, FeatureExtractorConfig};

/// Epsilon of batch normalization.
pub const BN_EPS: f64 = 1e-5;
