//! Errors in the library.
use thiserror::Error;

/// Errors raised while building or running the network.
#[derive(Error, Debug, PartialEq)]
pub enum DriverError {
    /// The input tensor does not have the shape `(batch, channels, height, width)`
    /// the network was built for.
    #[error("Input shape error: expected (batch, {expected:?}), got {actual:?}")]
    InputShape {
        expected: [usize; 3],
        actual: Vec<usize>,
    },

    /// The batch dimension of the input is zero.
    #[error("Input batch is empty")]
    EmptyBatch,

    /// A convolution kernel does not fit in its (padded) input.
    #[error("Spatial underflow at {stage}: input size {size} is smaller than kernel {kernel}")]
    SpatialUnderflow {
        stage: String,
        size: usize,
        kernel: usize,
    },

    /// A convolution has a stride of zero.
    #[error("Invalid stride at {0}: stride must be positive")]
    InvalidStride(String),

    /// The input channels of a convolution do not match the output channels of the
    /// preceding stage (or the input image).
    #[error("Channel mismatch at {stage}: expected {expected} input channels, configured {actual}")]
    ChannelMismatch {
        stage: String,
        expected: usize,
        actual: usize,
    },

    /// The flattened feature length does not match the input dimension of the first
    /// fully-connected layer.
    #[error("Flatten mismatch: head expects {expected} features, feature extractor yields {actual}")]
    FlattenMismatch { expected: usize, actual: usize },

    /// Dropout probability outside `[0, 1)`.
    #[error("Invalid dropout probability: {0}")]
    InvalidDropout(f32),

    /// No hidden unit is configured in the decision head.
    #[error("Decision head has no hidden layer")]
    EmptyHead,

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueType(String),
}
